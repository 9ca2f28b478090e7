//! The seam between a tool's URL-building logic and the transport that actually performs
//! the outbound request. `fingate-server::sink` is the concrete implementation; tools here
//! only ever see this trait, so they stay free of any knowledge of credentials or HTTP.

use async_trait::async_trait;

/// Performs a GET against the upstream API for `path_and_query` (e.g.
/// `/real-time/AAPL.US?fmt=json`) on behalf of the caller identified by `credential`.
///
/// Mirrors `make_request`'s contract: this never fails outright. Transport errors,
/// non-2xx responses, and non-JSON bodies are all folded into an `{"error": ...}`-shaped
/// `serde_json::Value`, exactly like the original always returning a dict.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get_json(&self, path_and_query: &str, credential: Option<&str>) -> serde_json::Value;
}
