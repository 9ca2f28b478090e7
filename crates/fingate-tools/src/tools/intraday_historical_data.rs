//! Grounded on `app/tools/get_intraday_historical_data.py`, including its per-interval
//! maximum span validation.

use crate::error::ToolError;
use crate::registry::{optional_str, required_str, Tool};
use crate::upstream::UpstreamClient;
use async_trait::async_trait;

const ALLOWED_INTERVALS: [&str; 3] = ["1m", "5m", "1h"];
const ALLOWED_FMT: [&str; 2] = ["json", "csv"];

fn max_range_days(interval: &str) -> i64 {
    match interval {
        "1m" => 120,
        "5m" => 600,
        "1h" => 7200,
        _ => 0,
    }
}

pub struct GetIntradayHistoricalData;

#[async_trait]
impl Tool for GetIntradayHistoricalData {
    fn name(&self) -> &'static str {
        "get_intraday_historical_data"
    }

    fn description(&self) -> &'static str {
        "Intraday price bars for a ticker within a bounded time span per interval."
    }

    async fn call(
        &self,
        client: &dyn UpstreamClient,
        arguments: &serde_json::Value,
        credential: Option<&str>,
    ) -> Result<serde_json::Value, ToolError> {
        let ticker = required_str(arguments, "ticker")?;
        let interval = optional_str(arguments, "interval").unwrap_or("5m");
        let fmt = optional_str(arguments, "fmt").unwrap_or("json");
        let from_timestamp = arguments.get("from_timestamp").and_then(|v| v.as_i64());
        let to_timestamp = arguments.get("to_timestamp").and_then(|v| v.as_i64());
        let split_dt = arguments.get("split_dt").and_then(|v| v.as_bool()).unwrap_or(false);

        if !ALLOWED_INTERVALS.contains(&interval) {
            return Err(ToolError::InvalidArguments(format!(
                "invalid interval {interval:?}, allowed: {ALLOWED_INTERVALS:?}"
            )));
        }
        if !ALLOWED_FMT.contains(&fmt) {
            return Err(ToolError::InvalidArguments(format!("invalid fmt {fmt:?}, allowed: {ALLOWED_FMT:?}")));
        }
        if let (Some(from), Some(to)) = (from_timestamp, to_timestamp) {
            if from > to {
                return Err(ToolError::InvalidArguments(
                    "from_timestamp cannot be greater than to_timestamp".to_string(),
                ));
            }
            let span_days = (to - from) / 86_400;
            if span_days > max_range_days(interval) {
                return Err(ToolError::InvalidArguments(format!(
                    "requested range exceeds the {} day maximum for interval {interval:?}",
                    max_range_days(interval)
                )));
            }
        }

        let mut path = format!("/intraday/{ticker}?fmt={fmt}&interval={interval}");
        if let Some(from) = from_timestamp {
            path.push_str(&format!("&from={from}"));
        }
        if let Some(to) = to_timestamp {
            path.push_str(&format!("&to={to}"));
        }
        if split_dt {
            path.push_str("&split-dt=1");
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

    #[test]
    fn rejects_a_span_past_the_interval_maximum() {
        assert_eq!(max_range_days("1m"), 120);
        assert_eq!(max_range_days("1h"), 7200);
    }

    #[tokio::test]
    async fn rejects_an_unknown_interval() {
        let tool = GetIntradayHistoricalData;
        let args = serde_json::json!({"ticker": "AAPL.US", "interval": "1d"});
        let result = tool.call(&NullClient, &args, None).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn rejects_a_span_exceeding_the_interval_maximum() {
        let tool = GetIntradayHistoricalData;
        let args = serde_json::json!({
            "ticker": "AAPL.US",
            "interval": "1m",
            "from_timestamp": 0,
            "to_timestamp": 200 * 86_400,
        });
        let result = tool.call(&NullClient, &args, None).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
