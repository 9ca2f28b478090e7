//! Protected-Resource middleware: validates bearer tokens on the OAuth mount and
//! resolves the authenticated request's upstream credential.

use crate::request_context::RequestCredential;
use crate::state::AuthState;
use crate::store::{Collection, Store, StoreExt};
use crate::types::{AccessToken, User};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use fingate_core::clock::is_expired;
use fingate_core::ids::sha256_hex;
use std::sync::Arc;

#[derive(Clone)]
pub struct PrMiddlewareState {
    pub auth: AuthState,
    /// Absolute path of the mount root this middleware protects, e.g. `/v2/mcp`.
    pub mount_root_path: String,
    pub excluded_paths: Arc<Vec<String>>,
}

pub async fn protected_resource_middleware(
    State(state): State<PrMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == axum::http::Method::OPTIONS {
        return next.run(request).await;
    }
    if state.excluded_paths.iter().any(|p| p == request.uri().path()) {
        return next.run(request).await;
    }

    let headers = request.headers().clone();
    let base_url = crate::state::canonical_base_url(
        &state.auth.config,
        &headers,
        request.uri().scheme_str().unwrap_or("https"),
        request
            .uri()
            .host()
            .or_else(|| headers.get("host").and_then(|v| v.to_str().ok()))
            .unwrap_or("localhost"),
    );
    let expected_audience = format!("{}{}", base_url.trim_end_matches('/'), state.mount_root_path);

    let token = match extract_bearer(&headers) {
        Some(t) if !t.is_empty() => t,
        _ => {
            return challenge_response(
                &state,
                &base_url,
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Missing bearer token",
            );
        }
    };

    let claims = match state.auth.codec.verify(&token) {
        Ok(claims) => claims,
        Err(_) => {
            return challenge_response(
                &state,
                &base_url,
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Token signature invalid or expired",
            );
        }
    };

    if !claims.aud.matches(&expected_audience) {
        return challenge_response(
            &state,
            &base_url,
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Token audience does not match this resource",
        );
    }

    if claims.sub.is_empty() {
        return challenge_response(
            &state,
            &base_url,
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Token subject is missing",
        );
    }

    let key = sha256_hex(&token);
    let stored: Option<AccessToken> = match state.auth.store.get(Collection::AccessTokens, &key).await {
        Ok(value) => value,
        Err(_) => {
            return challenge_response(
                &state,
                &base_url,
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Token lookup failed",
            );
        }
    };
    let stored = match stored {
        Some(t) if !is_expired(t.expires_at) => t,
        _ => {
            return challenge_response(
                &state,
                &base_url,
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Token is not known to this server",
            );
        }
    };

    let user: Option<User> = state
        .auth
        .store
        .get(Collection::Users, &stored.user_id)
        .await
        .unwrap_or(None);
    let Some(user) = user else {
        return challenge_response(
            &state,
            &base_url,
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Token subject no longer has a user record",
        );
    };

    tracing::debug!(subject = %stored.user_id, "bearer token validated on protected mount");
    request
        .extensions_mut()
        .insert(RequestCredential(user.upstream_credential));
    next.run(request).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_string)
}

fn challenge_response(
    state: &PrMiddlewareState,
    base_url: &str,
    status: StatusCode,
    error: &str,
    description: &str,
) -> Response {
    let resource_metadata = format!(
        "{}/.well-known/oauth-protected-resource{}",
        base_url.trim_end_matches('/'),
        state.mount_root_path
    );
    let challenge = format!(
        "Bearer realm=\"fingate\", resource_metadata=\"{resource_metadata}\", scope=\"{}\", error=\"{error}\", error_description=\"{description}\"",
        state.auth.config.default_scope
    );

    let body = serde_json::json!({ "error": error, "message": description });
    let mut response = (status, axum::Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::WWW_AUTHENTICATE,
        HeaderValue::from_str(&challenge).unwrap_or_else(|_| HeaderValue::from_static("Bearer")),
    );
    headers.insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_strips_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn extract_bearer_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc123"),
        );
        assert_eq!(extract_bearer(&headers), None);
    }
}
