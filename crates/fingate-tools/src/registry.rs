//! The tool registry: a name-keyed table of thin URL-builder tools, each a unit struct
//! implementing `Tool`. Grounded on `app/tools/__init__.py`'s `register_all`, which wires
//! the same kind of flat list of independent tool modules into one `FastMCP` instance.

use crate::error::ToolError;
use crate::upstream::UpstreamClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn call(
        &self,
        client: &dyn UpstreamClient,
        arguments: &serde_json::Value,
        credential: Option<&str>,
    ) -> Result<serde_json::Value, ToolError>;
}

pub struct ToolRegistry {
    client: Arc<dyn UpstreamClient>,
    tools: HashMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self {
            client,
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// The demonstrative handful this workspace ships, grounded one-for-one on
    /// `app/tools/*.py` modules.
    pub fn with_default_tools(client: Arc<dyn UpstreamClient>) -> Self {
        let mut registry = Self::new(client);
        registry.register(Box::new(crate::tools::current_stock_price::GetCurrentStockPrice));
        registry.register(Box::new(crate::tools::balance_sheets::GetBalanceSheets));
        registry.register(Box::new(crate::tools::cash_flow_statements::GetCashFlowStatements));
        registry.register(Box::new(crate::tools::intraday_historical_data::GetIntradayHistoricalData));
        registry.register(Box::new(crate::tools::stock_screener::StockScreener));
        registry
    }

    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut tools: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|t| ToolDescriptor {
                name: t.name(),
                description: t.description(),
            })
            .collect();
        tools.sort_by_key(|t| t.name);
        tools
    }

    pub async fn call(
        &self,
        name: &str,
        arguments: &serde_json::Value,
        credential: Option<&str>,
    ) -> Result<serde_json::Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.call(self.client.as_ref(), arguments, credential).await
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

/// Pull a required string field out of a tool's JSON arguments object.
pub(crate) fn required_str<'a>(arguments: &'a serde_json::Value, field: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{field}' is required")))
}

pub(crate) fn optional_str<'a>(arguments: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    arguments.get(field).and_then(|v| v.as_str())
}

pub(crate) fn optional_u64(arguments: &serde_json::Value, field: &str, default: u64) -> u64 {
    arguments.get(field).and_then(|v| v.as_u64()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamClient;

    struct EchoClient;

    #[async_trait]
    impl UpstreamClient for EchoClient {
        async fn get_json(&self, path_and_query: &str, _credential: Option<&str>) -> serde_json::Value {
            serde_json::json!({ "echoed": path_and_query })
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let registry = ToolRegistry::new(Arc::new(EchoClient));
        let result = registry.call("does-not-exist", &serde_json::json!({}), None).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn default_tools_are_all_registered() {
        let registry = ToolRegistry::with_default_tools(Arc::new(EchoClient));
        let names: Vec<&str> = registry.list().into_iter().map(|t| t.name).collect();
        assert!(names.contains(&"get_current_stock_price"));
        assert!(names.contains(&"get_balance_sheets"));
        assert!(names.contains(&"get_cash_flow_statements"));
        assert!(names.contains(&"get_intraday_historical_data"));
        assert!(names.contains(&"stock_screener"));
    }
}
