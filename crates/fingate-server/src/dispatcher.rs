//! Multi-mount request dispatcher: the Authorization Server inlined at the public
//! origin's root, the legacy mount, and the OAuth-protected mount, composed into a single
//! `axum::Router`. Grounded on `app/mount_apps.py`'s `create_multi_mount_app` — same three
//! mounts, same "exact path registered so there is no redirect" requirement, resolved here
//! with Axum's own router instead of ASGI scope rewriting (see DESIGN.md, Open Question 1).

use crate::rpc_handler::handle_rpc;
use axum::routing::post;
use axum::Router;
use fingate_auth::{as_server, legacy_identity_middleware, protected_resource_middleware, AuthState, PrMiddlewareState};
use fingate_tools::ToolRegistry;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(auth_state: AuthState, tool_registry: Arc<ToolRegistry>) -> Router {
    let oauth_mount = auth_state.config.oauth_resource_path.clone();
    let legacy_mount = auth_state.config.legacy_mount.clone();

    let auth_routes = as_server::router(auth_state.clone());
    let oauth_routes = oauth_mount_router(&auth_state, &oauth_mount, Arc::clone(&tool_registry));
    let legacy_routes = legacy_mount_router(&legacy_mount, tool_registry);

    Router::new()
        .merge(auth_routes)
        .merge(oauth_routes)
        .merge(legacy_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Registers both the exact mount path and its trailing-slash form so neither 307s into
/// the other before the protecting middleware ever runs.
fn oauth_mount_router(auth_state: &AuthState, mount: &str, tool_registry: Arc<ToolRegistry>) -> Router {
    let pr_state = PrMiddlewareState {
        auth: auth_state.clone(),
        mount_root_path: mount.to_string(),
        excluded_paths: Arc::new(Vec::new()),
    };

    Router::new()
        .route(mount, post(handle_rpc))
        .route(&format!("{mount}/"), post(handle_rpc))
        .route_layer(axum::middleware::from_fn_with_state(pr_state, protected_resource_middleware))
        .with_state(tool_registry)
}

fn legacy_mount_router(mount: &str, tool_registry: Arc<ToolRegistry>) -> Router {
    Router::new()
        .route(mount, post(handle_rpc))
        .route(&format!("{mount}/"), post(handle_rpc))
        .route_layer(axum::middleware::from_fn(legacy_identity_middleware))
        .with_state(tool_registry)
}
