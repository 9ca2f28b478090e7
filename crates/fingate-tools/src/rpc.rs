//! The minimal JSON-RPC 2.0 envelope this workspace needs: `tools/list` and `tools/call`.
//! Transport-agnostic by design (no Axum types here) so it can be driven over HTTP, an
//! in-process channel, or a test harness alike — grounded on the shape of
//! `ultrafast-mcp-core::protocol::jsonrpc`'s request/response types, trimmed to what the
//! tool-invocation surface actually uses.

use crate::error::ToolError;
use crate::registry::ToolRegistry;
use serde::{Deserialize, Serialize};

pub mod error_codes {
    pub const INVALID_PARAMS: i32 = -32602;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const TOOL_EXECUTION_ERROR: i32 = -32000;
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// Dispatch one JSON-RPC request against the registry. `credential` is the upstream
/// credential already resolved by the caller's middleware for this request.
pub async fn dispatch(registry: &ToolRegistry, request: RpcRequest, credential: Option<&str>) -> RpcResponse {
    match request.method.as_str() {
        "tools/list" => {
            let tools = registry.list();
            ok(request.id, serde_json::json!({ "tools": tools }))
        }
        "tools/call" => match call_tool(registry, &request.params, credential).await {
            Ok(content) => ok(request.id, content),
            Err(ToolError::UnknownTool(name)) => err(request.id, error_codes::METHOD_NOT_FOUND, format!("unknown tool: {name}")),
            Err(ToolError::InvalidArguments(reason)) => err(request.id, error_codes::INVALID_PARAMS, reason),
            Err(ToolError::Upstream(reason)) => err(request.id, error_codes::TOOL_EXECUTION_ERROR, reason),
        },
        other => err(request.id, error_codes::METHOD_NOT_FOUND, format!("unknown method: {other}")),
    }
}

async fn call_tool(
    registry: &ToolRegistry,
    params: &serde_json::Value,
    credential: Option<&str>,
) -> Result<serde_json::Value, ToolError> {
    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments("'name' is required".to_string()))?;
    let empty_args = serde_json::json!({});
    let arguments = params.get("arguments").unwrap_or(&empty_args);

    let result = registry.call(name, arguments, credential).await?;
    Ok(serde_json::json!({
        "content": [{ "type": "text", "text": result.to_string() }]
    }))
}

fn ok(id: serde_json::Value, result: serde_json::Value) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0",
        id,
        result: Some(result),
        error: None,
    }
}

fn err(id: serde_json::Value, code: i32, message: String) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(RpcError { code, message }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamClient;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoClient;

    #[async_trait]
    impl UpstreamClient for EchoClient {
        async fn get_json(&self, path_and_query: &str, _credential: Option<&str>) -> serde_json::Value {
            serde_json::json!({ "path": path_and_query })
        }
    }

    #[tokio::test]
    async fn tools_list_returns_every_registered_tool() {
        let registry = ToolRegistry::with_default_tools(Arc::new(EchoClient));
        let request = RpcRequest {
            jsonrpc: Some("2.0".to_string()),
            method: "tools/list".to_string(),
            params: serde_json::json!({}),
            id: serde_json::json!(1),
        };
        let response = dispatch(&registry, request, None).await;
        let tools = response.result.unwrap();
        assert!(tools["tools"].as_array().unwrap().len() >= 5);
    }

    #[tokio::test]
    async fn tools_call_with_unknown_name_reports_method_not_found() {
        let registry = ToolRegistry::with_default_tools(Arc::new(EchoClient));
        let request = RpcRequest {
            jsonrpc: Some("2.0".to_string()),
            method: "tools/call".to_string(),
            params: serde_json::json!({ "name": "does-not-exist", "arguments": {} }),
            id: serde_json::json!(2),
        };
        let response = dispatch(&registry, request, None).await;
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_call_invokes_the_tool_and_wraps_its_output_as_text_content() {
        let registry = ToolRegistry::with_default_tools(Arc::new(EchoClient));
        let request = RpcRequest {
            jsonrpc: Some("2.0".to_string()),
            method: "tools/call".to_string(),
            params: serde_json::json!({ "name": "get_current_stock_price", "arguments": { "ticker": "AAPL.US" } }),
            id: serde_json::json!(3),
        };
        let response = dispatch(&registry, request, Some("cred")).await;
        let content = &response.result.unwrap()["content"][0];
        assert_eq!(content["type"], "text");
        assert!(content["text"].as_str().unwrap().contains("AAPL.US"));
    }
}
