//! Grounded on `app/tools/get_cash_flow_statements.py`.

use crate::error::ToolError;
use crate::registry::{optional_str, optional_u64, required_str, Tool};
use crate::upstream::UpstreamClient;
use async_trait::async_trait;

pub struct GetCashFlowStatements;

#[async_trait]
impl Tool for GetCashFlowStatements {
    fn name(&self) -> &'static str {
        "get_cash_flow_statements"
    }

    fn description(&self) -> &'static str {
        "Recent cash-flow statements for a ticker, annual or quarterly."
    }

    async fn call(
        &self,
        client: &dyn UpstreamClient,
        arguments: &serde_json::Value,
        credential: Option<&str>,
    ) -> Result<serde_json::Value, ToolError> {
        let ticker = required_str(arguments, "ticker")?;
        let period = optional_str(arguments, "period").unwrap_or("annual");
        let limit = optional_u64(arguments, "limit", 4) as usize;

        let path = format!("/fundamentals/{ticker}?fmt=json");
        let data = client.get_json(&path, credential).await;

        let statements = data
            .get("Financials")
            .and_then(|v| v.get("Cash_Flow"))
            .and_then(|v| v.get(period))
            .and_then(|v| v.as_object());

        Ok(match statements {
            Some(map) => serde_json::Value::Array(map.values().take(limit).cloned().collect()),
            None => serde_json::json!({ "error": "Unable to fetch or parse cash flow statements." }),
        })
    }
}
