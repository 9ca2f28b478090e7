//! Grounded on `app/tools/get_balance_sheets.py`.

use crate::error::ToolError;
use crate::registry::{optional_str, optional_u64, required_str, Tool};
use crate::upstream::UpstreamClient;
use async_trait::async_trait;

pub struct GetBalanceSheets;

#[async_trait]
impl Tool for GetBalanceSheets {
    fn name(&self) -> &'static str {
        "get_balance_sheets"
    }

    fn description(&self) -> &'static str {
        "Recent balance-sheet statements for a ticker, annual or quarterly."
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
        Ok(extract_statements(&data, period, limit))
    }
}

fn extract_statements(data: &serde_json::Value, period: &str, limit: usize) -> serde_json::Value {
    let statements = data
        .get("Financials")
        .and_then(|v| v.get("Balance_Sheet"))
        .and_then(|v| v.get(period))
        .and_then(|v| v.as_object());

    match statements {
        Some(map) => serde_json::Value::Array(map.values().take(limit).cloned().collect()),
        None => serde_json::json!({ "error": "Unable to fetch or parse balance sheets." }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_limits_the_requested_period() {
        let data = serde_json::json!({
            "Financials": {
                "Balance_Sheet": {
                    "annual": {
                        "2023-12-31": {"totalAssets": 1},
                        "2022-12-31": {"totalAssets": 2},
                    }
                }
            }
        });
        let result = extract_statements(&data, "annual", 1);
        assert_eq!(result.as_array().unwrap().len(), 1);
    }

    #[test]
    fn missing_financials_reports_an_error_value() {
        let result = extract_statements(&serde_json::json!({}), "annual", 4);
        assert!(result.get("error").is_some());
    }
}
