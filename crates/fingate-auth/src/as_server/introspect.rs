//! `POST /introspect` — RFC 7662 token introspection.

use crate::state::AuthState;
use crate::store::{Collection, StoreExt};
use crate::types::AccessToken;
use axum::extract::State;
use axum::Form;
use axum::Json;
use fingate_core::clock::is_expired;
use fingate_core::ids::sha256_hex;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IntrospectForm {
    pub token: Option<String>,
}

pub async fn introspect(State(state): State<AuthState>, Form(form): Form<IntrospectForm>) -> Json<serde_json::Value> {
    let Some(token) = form.token.filter(|t| !t.is_empty()) else {
        return Json(serde_json::json!({ "active": false }));
    };

    let Ok(claims) = state.codec.verify(&token) else {
        return Json(serde_json::json!({ "active": false }));
    };

    let stored: Option<AccessToken> = state
        .store
        .get(Collection::AccessTokens, &sha256_hex(&token))
        .await
        .unwrap_or(None);
    let Some(stored) = stored else {
        return Json(serde_json::json!({ "active": false }));
    };
    if is_expired(stored.expires_at) {
        return Json(serde_json::json!({ "active": false }));
    }

    Json(serde_json::json!({
        "active": true,
        "iss": claims.iss,
        "sub": claims.sub,
        "aud": claims.aud,
        "client_id": claims.client_id,
        "scope": claims.scope,
        "exp": claims.exp,
        "iat": claims.iat,
    }))
}
