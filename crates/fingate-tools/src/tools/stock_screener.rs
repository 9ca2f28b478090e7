//! Grounded on `app/tools/get_stock_screener_data.py`, minus its `quote_plus` manual
//! percent-encoding (we let the upstream sink own URL construction details; tools only
//! build the logical path and query string here).

use crate::error::ToolError;
use crate::registry::{optional_str, optional_u64, Tool};
use crate::upstream::UpstreamClient;
use async_trait::async_trait;

pub struct StockScreener;

#[async_trait]
impl Tool for StockScreener {
    fn name(&self) -> &'static str {
        "stock_screener"
    }

    fn description(&self) -> &'static str {
        "Screens stocks by filters and signals, paginated."
    }

    async fn call(
        &self,
        client: &dyn UpstreamClient,
        arguments: &serde_json::Value,
        credential: Option<&str>,
    ) -> Result<serde_json::Value, ToolError> {
        let limit = optional_u64(arguments, "limit", 50);
        let offset = optional_u64(arguments, "offset", 0);
        if !(1..=100).contains(&limit) {
            return Err(ToolError::InvalidArguments("limit must be between 1 and 100".to_string()));
        }
        if offset > 999 {
            return Err(ToolError::InvalidArguments("offset must be between 0 and 999".to_string()));
        }

        let mut path = format!("/screener?1=1&limit={limit}&offset={offset}");
        if let Some(sort) = optional_str(arguments, "sort") {
            path.push_str(&format!("&sort={sort}"));
        }
        if let Some(filters) = arguments.get("filters") {
            if !filters.is_null() {
                let filters = match filters {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                path.push_str(&format!("&filters={filters}"));
            }
        }
        if let Some(signals) = arguments.get("signals") {
            let signals = match signals {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Array(items) => {
                    let joined: Vec<String> = items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
                    if joined.is_empty() {
                        None
                    } else {
                        Some(joined.join(","))
                    }
                }
                _ => None,
            };
            if let Some(signals) = signals {
                path.push_str(&format!("&signals={signals}"));
            }
        }

        Ok(client.get_json(&path, credential).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullClient;

    #[async_trait]
    impl UpstreamClient for NullClient {
        async fn get_json(&self, _path_and_query: &str, _credential: Option<&str>) -> serde_json::Value {
            serde_json::json!({})
        }
    }

    #[tokio::test]
    async fn rejects_limit_out_of_bounds() {
        let tool = StockScreener;
        let args = serde_json::json!({"limit": 500});
        let result = tool.call(&NullClient, &args, None).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
