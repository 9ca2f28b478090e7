//! The per-request context carrying a resolved upstream credential between whichever
//! middleware resolves it (PR or Legacy) and the Upstream Credential Sink. Always an
//! Axum request extension — never a global (spec-mandated request locality).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCredential(pub String);

impl RequestCredential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
