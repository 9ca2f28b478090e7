//! `GET /authorize` — the authorization-code grant's front door.

use super::{SESSION_KEY_LOGGED_IN_EMAIL, SESSION_KEY_RETURN_TO};
use crate::pkce::CHALLENGE_METHOD_S256;
use crate::state::{canonical_base_url, AuthState};
use crate::store::{Collection, StoreExt};
use crate::types::{AuthorizationCode, RegisteredClient};
use axum::extract::{OriginalUri, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use fingate_core::clock::{now_unix, ttl_seconds};
use fingate_core::ids::generate_secure_random;
use serde::Deserialize;
use std::time::Duration;
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub scope: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub resource: Option<String>,
}

pub async fn authorize(
    State(state): State<AuthState>,
    session: Session,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let logged_in_email: Option<String> = session.get(SESSION_KEY_LOGGED_IN_EMAIL).await.ok().flatten();
    let Some(user_id) = logged_in_email else {
        let _ = session
            .insert(SESSION_KEY_RETURN_TO, uri.to_string())
            .await;
        return Redirect::to("/login").into_response();
    };

    if query.response_type.as_deref() != Some("code") {
        return error_page("unsupported_response_type", "response_type must be \"code\"");
    }
    let (Some(client_id), Some(redirect_uri)) = (query.client_id.clone(), query.redirect_uri.clone()) else {
        return error_page("invalid_request", "client_id and redirect_uri are required");
    };

    let client = match resolve_client(&state, &client_id).await {
        Some(client) => client,
        None => return error_page("invalid_client", "unknown client_id"),
    };

    if !client.redirect_uris.contains(&redirect_uri) {
        return if redirect_uri.starts_with("http://") || redirect_uri.starts_with("https://") {
            Redirect::to(&format!(
                "{redirect_uri}{}error=invalid_request",
                if redirect_uri.contains('?') { "&" } else { "?" }
            ))
            .into_response()
        } else {
            error_page("invalid_request", "redirect_uri is not http/https")
        };
    }

    if let Some(method) = &query.code_challenge_method {
        if method != CHALLENGE_METHOD_S256 {
            return redirect_with_error(&redirect_uri, &query.state, "invalid_request");
        }
        if query.code_challenge.is_none() {
            return redirect_with_error(&redirect_uri, &query.state, "invalid_request");
        }
    }

    let base_url = canonical_base_url(
        &state.config,
        &headers,
        "https",
        headers.get("host").and_then(|v| v.to_str().ok()).unwrap_or("localhost"),
    );
    let resource = state.expected_resource(&base_url);
    if let Some(requested_resource) = &query.resource {
        if requested_resource.trim_end_matches('/') != resource.trim_end_matches('/') {
            return redirect_with_error(&redirect_uri, &query.state, "invalid_target");
        }
    }

    let scope = query.scope.clone().unwrap_or_else(|| state.config.default_scope.clone());
    let code = generate_secure_random(64);
    let auth_code = AuthorizationCode {
        code: code.clone(),
        client_id: client.client_id.clone(),
        redirect_uri: redirect_uri.clone(),
        user_id,
        scopes: scope.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect(),
        resource,
        expires_at: now_unix() + state.config.auth_code_expires.as_secs() as i64,
        code_challenge: query.code_challenge.clone(),
        code_challenge_method: query.code_challenge_method.clone(),
    };

    if state
        .store
        .put(
            Collection::AuthCodes,
            &code,
            &auth_code,
            Some(Duration::from_secs(ttl_seconds(auth_code.expires_at))),
        )
        .await
        .is_err()
    {
        return error_page("server_error", "failed to persist the authorization code");
    }

    let mut redirect_url = format!("{redirect_uri}{}code={code}", if redirect_uri.contains('?') { "&" } else { "?" });
    if let Some(echoed_state) = &query.state {
        redirect_url.push_str(&format!("&state={echoed_state}"));
    }
    Redirect::to(&redirect_url).into_response()
}

async fn resolve_client(state: &AuthState, client_id: &str) -> Option<RegisteredClient> {
    if let Ok(Some(client)) = state.store.get::<RegisteredClient>(Collection::Clients, client_id).await {
        return Some(client);
    }
    if client_id.starts_with("https://") {
        return state.resolver.resolve(client_id).await.ok();
    }
    None
}

fn redirect_with_error(redirect_uri: &str, echoed_state: &Option<String>, error: &str) -> Response {
    let mut url = format!(
        "{redirect_uri}{}error={error}",
        if redirect_uri.contains('?') { "&" } else { "?" }
    );
    if let Some(s) = echoed_state {
        url.push_str(&format!("&state={s}"));
    }
    Redirect::to(&url).into_response()
}

fn error_page(error: &str, description: &str) -> Response {
    let body = format!(
        "<!doctype html><html><head><title>Authorization error</title></head><body>\
<h1>{error}</h1><p>{description}</p></body></html>"
    );
    (axum::http::StatusCode::BAD_REQUEST, Html(body)).into_response()
}
