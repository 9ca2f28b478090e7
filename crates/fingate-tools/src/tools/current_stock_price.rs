//! Grounded on `app/tools/get_current_stock_price.py`.

use crate::error::ToolError;
use crate::registry::{required_str, Tool};
use crate::upstream::UpstreamClient;
use async_trait::async_trait;

pub struct GetCurrentStockPrice;

#[async_trait]
impl Tool for GetCurrentStockPrice {
    fn name(&self) -> &'static str {
        "get_current_stock_price"
    }

    fn description(&self) -> &'static str {
        "Real-time quote for a ticker, e.g. AAPL.US."
    }

    async fn call(
        &self,
        client: &dyn UpstreamClient,
        arguments: &serde_json::Value,
        credential: Option<&str>,
    ) -> Result<serde_json::Value, ToolError> {
        let ticker = required_str(arguments, "ticker")?;
        let path = format!("/real-time/{ticker}?fmt=json");
        Ok(client.get_json(&path, credential).await)
    }
}
