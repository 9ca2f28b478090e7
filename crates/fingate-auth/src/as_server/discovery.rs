//! RFC 8414 authorization-server metadata and RFC 9728 protected-resource metadata.
//! Both must be reachable at the public origin's root, never under a mounted prefix.

use crate::state::{canonical_base_url, AuthState};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

pub async fn authorization_server_metadata(State(state): State<AuthState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let base_url = request_base_url(&state, &headers);
    Json(serde_json::json!({
        "issuer": base_url,
        "authorization_endpoint": format!("{base_url}/authorize"),
        "token_endpoint": format!("{base_url}/token"),
        "registration_endpoint": format!("{base_url}/register"),
        "introspection_endpoint": format!("{base_url}/introspect"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "code_challenge_methods_supported": ["S256"],
        "token_endpoint_auth_methods_supported": ["client_secret_post", "client_secret_basic", "none"],
        "scopes_supported": [state.config.default_scope.clone()],
        "client_id_metadata_document_supported": true,
    }))
}

pub async fn protected_resource_metadata(State(state): State<AuthState>, headers: HeaderMap) -> Json<serde_json::Value> {
    build_resource_metadata(&state, &headers, &state.config.oauth_resource_path.clone())
}

pub async fn protected_resource_metadata_for_path(
    State(state): State<AuthState>,
    headers: HeaderMap,
    Path(resource_path): Path<String>,
) -> Json<serde_json::Value> {
    let path = format!("/{resource_path}");
    build_resource_metadata(&state, &headers, &path)
}

fn build_resource_metadata(state: &AuthState, headers: &HeaderMap, resource_path: &str) -> Json<serde_json::Value> {
    let base_url = request_base_url(state, headers);
    let resource = format!("{}{}", base_url.trim_end_matches('/'), resource_path);
    Json(serde_json::json!({
        "resource": resource,
        "authorization_servers": [base_url],
        "bearer_methods_supported": ["header"],
        "scopes_supported": [state.config.default_scope.clone()],
        "resource_documentation": format!("{base_url}/.well-known/oauth-authorization-server"),
    }))
}

fn request_base_url(state: &AuthState, headers: &HeaderMap) -> String {
    canonical_base_url(
        &state.config,
        headers,
        "https",
        headers.get("host").and_then(|v| v.to_str().ok()).unwrap_or("localhost"),
    )
}
