//! `POST /token` — the authorization-code grant's token endpoint.

use crate::pkce;
use crate::state::{canonical_base_url, AuthState};
use crate::store::{Collection, StoreExt};
use crate::types::{AccessToken, Audience, AuthorizationCode, RegisteredClient, TokenClaims};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Form, Json};
use base64::Engine;
use fingate_core::clock::{now_unix, ttl_seconds};
use fingate_core::ids::{generate_uuid, sha256_hex};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code_verifier: Option<String>,
    pub resource: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub scope: String,
}

type TokenError = (StatusCode, Json<serde_json::Value>);

pub async fn token(
    State(state): State<AuthState>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, TokenError> {
    if form.grant_type.as_deref() != Some("authorization_code") {
        return Err(oauth_error(
            StatusCode::BAD_REQUEST,
            "unsupported_grant_type",
            "only authorization_code is supported",
        ));
    }

    let (client_id, client_secret) = resolve_client_credentials(&headers, &form)?;
    let client: RegisteredClient = state
        .store
        .get(Collection::Clients, &client_id)
        .await
        .map_err(|_| server_error())?
        .ok_or_else(|| oauth_error(StatusCode::UNAUTHORIZED, "invalid_client", "unknown client"))?;

    if !client.is_public() {
        let provided = client_secret.as_deref();
        if provided.is_none() || provided != client.client_secret.as_deref() {
            return Err(oauth_error(
                StatusCode::UNAUTHORIZED,
                "invalid_client",
                "client secret mismatch",
            ));
        }
    }

    let code_value = form
        .code
        .as_deref()
        .ok_or_else(|| oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "code is required"))?;
    let auth_code: AuthorizationCode = state
        .store
        .consume(Collection::AuthCodes, code_value)
        .await
        .map_err(|_| server_error())?
        .ok_or_else(|| oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "code is unknown or expired"))?;

    if now_unix() >= auth_code.expires_at {
        return Err(oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "code has expired"));
    }
    if auth_code.client_id != client_id {
        return Err(oauth_error(
            StatusCode::BAD_REQUEST,
            "invalid_grant",
            "code was not issued to this client",
        ));
    }
    if form.redirect_uri.as_deref() != Some(auth_code.redirect_uri.as_str()) {
        return Err(oauth_error(
            StatusCode::BAD_REQUEST,
            "invalid_grant",
            "redirect_uri does not match the authorization request",
        ));
    }

    let base_url = canonical_base_url(
        &state.config,
        &headers,
        "https",
        headers.get("host").and_then(|v| v.to_str().ok()).unwrap_or("localhost"),
    );
    let expected_resource = state.expected_resource(&base_url);
    let resource = match &form.resource {
        Some(requested) => {
            if requested.trim_end_matches('/') != expected_resource.trim_end_matches('/') {
                return Err(oauth_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_target",
                    "resource does not match the configured protected resource",
                ));
            }
            expected_resource
        }
        None => expected_resource,
    };

    if let Some(challenge) = &auth_code.code_challenge {
        if auth_code.code_challenge_method.as_deref() != Some(pkce::CHALLENGE_METHOD_S256) {
            return Err(oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "unsupported challenge method"));
        }
        let verifier = form
            .code_verifier
            .as_deref()
            .ok_or_else(|| oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "code_verifier is required"))?;
        if !pkce::verify(verifier, challenge) {
            return Err(oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "code_verifier does not match"));
        }
    }

    let scope = auth_code.scopes.join(" ");
    let now = now_unix();
    let claims = TokenClaims {
        iss: base_url,
        sub: auth_code.user_id.clone(),
        aud: Audience::Single(resource),
        client_id: client_id.clone(),
        scope: scope.clone(),
        iat: now,
        exp: now + state.config.access_token_expires.as_secs() as i64,
        jti: generate_uuid(),
    };
    let token = state.codec.issue(&claims).map_err(|_| server_error())?;

    let access_token = AccessToken {
        token: token.clone(),
        client_id,
        user_id: auth_code.user_id,
        scopes: auth_code.scopes,
        expires_at: claims.exp,
        issued_at: claims.iat,
    };
    state
        .store
        .put(
            Collection::AccessTokens,
            &sha256_hex(&token),
            &access_token,
            Some(Duration::from_secs(ttl_seconds(access_token.expires_at))),
        )
        .await
        .map_err(|_| server_error())?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in: state.config.access_token_expires.as_secs(),
        scope,
    }))
}

fn resolve_client_credentials(headers: &HeaderMap, form: &TokenForm) -> Result<(String, Option<String>), TokenError> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(encoded) = auth.strip_prefix("Basic ") {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|_| oauth_error(StatusCode::UNAUTHORIZED, "invalid_client", "malformed Basic auth"))?;
            let text = String::from_utf8(decoded)
                .map_err(|_| oauth_error(StatusCode::UNAUTHORIZED, "invalid_client", "malformed Basic auth"))?;
            if let Some((id, secret)) = text.split_once(':') {
                return Ok((id.to_string(), Some(secret.to_string())));
            }
        }
    }
    form.client_id
        .clone()
        .map(|id| (id, form.client_secret.clone()))
        .ok_or_else(|| oauth_error(StatusCode::UNAUTHORIZED, "invalid_client", "client_id is required"))
}

fn oauth_error(status: StatusCode, error: &str, description: &str) -> TokenError {
    (
        status,
        Json(serde_json::json!({ "error": error, "error_description": description })),
    )
}

fn server_error() -> TokenError {
    oauth_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "storage operation failed")
}
