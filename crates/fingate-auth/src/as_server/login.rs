//! `GET/POST /login` — the single-field credential-submission page that bridges into
//! `/authorize` via the session cookie.

use super::{SESSION_KEY_LOGGED_IN_EMAIL, SESSION_KEY_RETURN_TO};
use crate::state::AuthState;
use crate::store::{Collection, StoreExt};
use crate::types::User;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use fingate_core::clock::now_unix;
use fingate_core::ids::sha256_hex;
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

pub async fn show_login(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(render_login_page(query.error.as_deref()))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub credential: String,
}

pub async fn submit_login(
    State(state): State<AuthState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let credential = form.credential.trim();
    if credential.is_empty() {
        return Redirect::to("/login?error=missing_credential").into_response();
    }

    let credential_key = sha256_hex(credential);
    let existing_email: Option<String> = state
        .store
        .get(Collection::CredentialIndex, &credential_key)
        .await
        .unwrap_or(None);

    let email = if let Some(email) = existing_email {
        email
    } else {
        match verify_identity(&state, credential).await {
            Ok(verified) => {
                let user = User {
                    email: verified.email.clone(),
                    upstream_credential: credential.to_string(),
                    name: verified.name,
                    subscription_type: verified.subscription_type,
                    scopes: vec![state.config.default_scope.clone()],
                    created_at: now_unix(),
                };
                if state
                    .store
                    .put(Collection::Users, &user.email, &user, None)
                    .await
                    .is_err()
                    || state
                        .store
                        .put(Collection::CredentialIndex, &credential_key, &user.email, None)
                        .await
                        .is_err()
                {
                    return Redirect::to("/login?error=storage_error").into_response();
                }
                user.email
            }
            Err(reason) => {
                return Redirect::to(&format!("/login?error={reason}")).into_response();
            }
        }
    };

    if session.insert(SESSION_KEY_LOGGED_IN_EMAIL, &email).await.is_err() {
        return Redirect::to("/login?error=session_error").into_response();
    }

    let return_to: Option<String> = session.get(SESSION_KEY_RETURN_TO).await.ok().flatten();
    Redirect::to(&return_to.unwrap_or_else(|| "/".to_string())).into_response()
}

struct VerifiedIdentity {
    email: String,
    name: String,
    subscription_type: String,
}

async fn verify_identity(state: &AuthState, credential: &str) -> Result<VerifiedIdentity, &'static str> {
    let url = format!(
        "{}/api/internal-user?api_token={}",
        state.config.upstream_api_base.trim_end_matches('/'),
        credential
    );
    let response = state
        .identity_http
        .get(&url)
        .send()
        .await
        .map_err(|_| "identity_verify_timeout")?;

    if !response.status().is_success() {
        return Err("identity_verify_failed");
    }

    let body: serde_json::Value = response.json().await.map_err(|_| "identity_verify_non_json")?;
    let email = body
        .get("email")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or("identity_verify_missing_email")?;

    Ok(VerifiedIdentity {
        email: email.to_string(),
        name: body.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        subscription_type: body
            .get("subscriptionType")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

fn render_login_page(error: Option<&str>) -> String {
    let error_html = error
        .map(|e| format!("<p class=\"error\">{}</p>", html_escape(e)))
        .unwrap_or_default();
    format!(
        "<!doctype html><html><head><title>Sign in</title></head><body>\
{error_html}\
<form method=\"post\" action=\"/login\">\
<label for=\"credential\">API Key</label>\
<input type=\"password\" id=\"credential\" name=\"credential\" autocomplete=\"off\" required>\
<button type=\"submit\">Sign in</button>\
</form></body></html>"
    )
}

fn html_escape(input: &str) -> String {
    input.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_login_page_echoes_error_query_param() {
        let page = render_login_page(Some("identity_verify_failed"));
        assert!(page.contains("identity_verify_failed"));
    }

    #[test]
    fn render_login_page_escapes_html_in_error() {
        let page = render_login_page(Some("<script>"));
        assert!(!page.contains("<script>"));
    }
}
