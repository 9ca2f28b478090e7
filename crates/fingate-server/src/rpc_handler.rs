//! Axum binding for the tool-invocation JSON-RPC surface. Kept separate from
//! `fingate_tools::rpc` so that module stays free of any HTTP-framework dependency.

use axum::extract::{Extension, State};
use axum::Json;
use fingate_auth::RequestCredential;
use fingate_tools::rpc::{dispatch, RpcRequest, RpcResponse};
use fingate_tools::ToolRegistry;
use std::sync::Arc;

pub async fn handle_rpc(
    State(registry): State<Arc<ToolRegistry>>,
    credential: Option<Extension<RequestCredential>>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let credential = credential.map(|Extension(c)| c);
    let response = dispatch(&registry, request, credential.as_ref().map(RequestCredential::as_str)).await;
    Json(response)
}
