//! `POST /register` — RFC 7591 dynamic client registration.

use crate::state::AuthState;
use crate::store::{Collection, StoreExt};
use crate::types::{RegisteredClient, TokenAuthMethod};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use fingate_core::clock::now_unix;
use fingate_core::ids::{generate_secure_random, generate_uuid};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub redirect_uris: Vec<String>,
    pub client_name: Option<String>,
    pub token_endpoint_auth_method: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub client_secret_expires_at: i64,
    pub redirect_uris: Vec<String>,
    pub client_name: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: String,
}

pub async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, (StatusCode, Json<serde_json::Value>)> {
    if body.redirect_uris.is_empty()
        || body
            .redirect_uris
            .iter()
            .any(|uri| !(uri.starts_with("http://") || uri.starts_with("https://")))
    {
        return Err(oauth_error(
            StatusCode::BAD_REQUEST,
            "invalid_client_metadata",
            "redirect_uris must be a non-empty list of http or https URLs",
        ));
    }

    let requested_method = body.token_endpoint_auth_method.as_deref();
    let (token_auth_method, client_secret) = if requested_method == Some("none") {
        (TokenAuthMethod::None, None)
    } else {
        let method = requested_method
            .and_then(TokenAuthMethod::parse)
            .filter(|m| !matches!(m, TokenAuthMethod::None))
            .unwrap_or(TokenAuthMethod::ClientSecretPost);
        (method, Some(generate_secure_random(48)))
    };

    let client_id = body.client_id.clone().unwrap_or_else(generate_uuid);
    let client_name = body.client_name.clone().unwrap_or_else(|| "unnamed client".to_string());

    let client = RegisteredClient {
        client_id: client_id.clone(),
        client_secret: client_secret.clone(),
        redirect_uris: body.redirect_uris.clone(),
        client_name: client_name.clone(),
        grant_types: vec!["authorization_code".to_string()],
        response_types: vec!["code".to_string()],
        token_auth_method,
        created_at: now_unix(),
    };

    state
        .store
        .put(Collection::Clients, &client_id, &client, None)
        .await
        .map_err(|_| {
            oauth_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "failed to persist the registered client",
            )
        })?;

    Ok(Json(RegisterResponse {
        client_id,
        client_secret,
        client_secret_expires_at: 0,
        redirect_uris: client.redirect_uris,
        client_name: client.client_name,
        grant_types: client.grant_types,
        response_types: client.response_types,
        token_endpoint_auth_method: client.token_auth_method.as_str().to_string(),
    }))
}

fn oauth_error(status: StatusCode, error: &str, description: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::json!({ "error": error, "error_description": description })),
    )
}
