//! The Authorization Server: registration, login, authorize, token, introspection, and
//! discovery, all sharing a single cookie-based session used only to bridge `/login` to
//! `/authorize`.

mod authorize;
mod discovery;
mod introspect;
mod login;
mod register;
mod token;

use crate::state::AuthState;
use axum::routing::{get, post};
use axum::Router;
use tower_sessions::{MemoryStore as SessionMemoryStore, SessionManagerLayer};

/// Builds the AS router. Callers inline these routes directly onto the outer
/// dispatcher router (not mounted under a prefix) so that the two `/.well-known/...`
/// discovery paths resolve at the public origin's root per RFC 8414 / 9728.
pub fn router(state: AuthState) -> Router {
    let session_store = SessionMemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_name("fingate_session");

    Router::new()
        .route("/register", post(register::register))
        .route("/login", get(login::show_login).post(login::submit_login))
        .route("/authorize", get(authorize::authorize))
        .route("/token", post(token::token))
        .route("/introspect", post(introspect::introspect))
        .route(
            "/.well-known/oauth-authorization-server",
            get(discovery::authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource",
            get(discovery::protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource/{*resource_path}",
            get(discovery::protected_resource_metadata_for_path),
        )
        .layer(session_layer)
        .with_state(state)
}

pub(crate) const SESSION_KEY_LOGGED_IN_EMAIL: &str = "logged_in_email";
pub(crate) const SESSION_KEY_RETURN_TO: &str = "oauth_return_to";
