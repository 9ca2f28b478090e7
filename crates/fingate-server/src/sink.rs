//! The Upstream Credential Sink: the single place that actually calls the upstream
//! financial-data API, injecting whichever credential the request's middleware resolved.
//! Grounded on `app/api_client.py`'s `make_request` — same fallback order, same
//! "never propagate a raw error, always return a JSON-shaped value" contract.

use fingate_core::config::AppConfig;
use fingate_tools::UpstreamClient;
use std::sync::Arc;

const TEXT_SNIPPET_LIMIT: usize = 2000;

pub struct UpstreamSink {
    http: reqwest::Client,
    base_url: String,
    credential_env_var: String,
}

impl UpstreamSink {
    pub fn new(config: &Arc<AppConfig>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_api_timeout)
            .build()
            .expect("building the upstream HTTP client cannot fail for this config");
        Self {
            http,
            base_url: config.upstream_api_base.trim_end_matches('/').to_string(),
            credential_env_var: config.upstream_credential_env_var.clone(),
        }
    }

    fn resolve_credential(&self, credential: Option<&str>) -> Option<String> {
        credential
            .map(str::to_string)
            .or_else(|| std::env::var(&self.credential_env_var).ok())
    }
}

#[async_trait::async_trait]
impl UpstreamClient for UpstreamSink {
    async fn get_json(&self, path_and_query: &str, credential: Option<&str>) -> serde_json::Value {
        let mut url = format!("{}{path_and_query}", self.base_url);
        if !url.contains("api_token=") {
            let Some(token) = self.resolve_credential(credential) else {
                return serde_json::json!({ "error": "Missing API token." });
            };
            url.push_str(if url.contains('?') { "&" } else { "?" });
            url.push_str(&format!("api_token={token}"));
        }

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                let message = transport_error_message(&error);
                tracing::warn!(error = %message, "upstream request failed");
                return serde_json::json!({ "error": message });
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = match response.text().await {
            Ok(text) => text,
            Err(error) => return serde_json::json!({ "error": transport_error_message(&error) }),
        };

        if !status.is_success() {
            return serde_json::json!({
                "error": format!("upstream returned {status}"),
                "status_code": status.as_u16(),
                "text": snippet(&text),
            });
        }

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => value,
            Err(_) => serde_json::json!({
                "error": "upstream response was not valid JSON",
                "status_code": status.as_u16(),
                "content_type": content_type,
                "text": snippet(&text),
            }),
        }
    }
}

/// `reqwest::Error`'s `Display` embeds the request URL verbatim, which here would leak
/// `upstream_credential` from the query string into a log line or error body. Never
/// format the error directly; classify it into a static message instead.
fn transport_error_message(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "upstream request timed out"
    } else if error.is_connect() {
        "upstream connection failed"
    } else if error.is_decode() {
        "upstream response could not be decoded"
    } else {
        "upstream request failed"
    }
}

fn snippet(text: &str) -> &str {
    match text.char_indices().nth(TEXT_SNIPPET_LIMIT) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
