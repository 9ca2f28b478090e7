//! Shared state threaded through the Authorization Server handlers and the
//! protected-resource / legacy middleware via Axum's `State` extractor.

use crate::codec::TokenCodec;
use crate::resolver::ClientMetadataResolver;
use crate::store::Store;
use fingate_core::config::AppConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn Store>,
    pub codec: Arc<TokenCodec>,
    pub resolver: Arc<ClientMetadataResolver>,
    pub config: Arc<AppConfig>,
    pub identity_http: reqwest::Client,
}

impl AuthState {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        let codec = Arc::new(TokenCodec::new(
            &config.jwt_secret,
            parse_algorithm(&config.jwt_algorithm),
        ));
        let resolver = Arc::new(ClientMetadataResolver::new(
            Arc::clone(&store),
            config.client_meta.clone(),
        ));
        let identity_http = reqwest::Client::builder()
            .timeout(config.identity_verify_timeout)
            .build()
            .expect("building the identity-verify HTTP client cannot fail for this config");
        Self {
            store,
            codec,
            resolver,
            config,
            identity_http,
        }
    }

    /// `server_base_url + configured_resource_path`, the expected audience for the
    /// OAuth-protected mount.
    pub fn expected_resource(&self, base_url: &str) -> String {
        format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            self.config.oauth_resource_path
        )
    }
}

fn parse_algorithm(raw: &str) -> jsonwebtoken::Algorithm {
    match raw {
        "HS256" => jsonwebtoken::Algorithm::HS256,
        "HS384" => jsonwebtoken::Algorithm::HS384,
        "HS512" => jsonwebtoken::Algorithm::HS512,
        other => {
            tracing::warn!("unknown JWT_ALGORITHM {other:?}, defaulting to HS256");
            jsonwebtoken::Algorithm::HS256
        }
    }
}

/// Derive the canonical external base URL: configured URL takes precedence; otherwise
/// `X-Forwarded-Proto`/`X-Forwarded-Host`; otherwise the request's own scheme and host.
pub fn canonical_base_url(config: &AppConfig, headers: &axum::http::HeaderMap, fallback_scheme: &str, fallback_host: &str) -> String {
    if let Some(configured) = &config.server_url {
        return configured.trim_end_matches('/').to_string();
    }
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback_scheme);
    let host = headers
        .get("x-forwarded-host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback_host);
    format!("{proto}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_base_url_prefers_configured_server_url() {
        let mut config = test_config();
        config.server_url = Some("https://configured.example/".to_string());
        let headers = axum::http::HeaderMap::new();
        assert_eq!(
            canonical_base_url(&config, &headers, "http", "ignored.example"),
            "https://configured.example"
        );
    }

    #[test]
    fn canonical_base_url_falls_back_to_forwarded_headers() {
        let mut config = test_config();
        config.server_url = None;
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        headers.insert("x-forwarded-host", "proxied.example".parse().unwrap());
        assert_eq!(
            canonical_base_url(&config, &headers, "http", "direct.example"),
            "https://proxied.example"
        );
    }

    #[test]
    fn canonical_base_url_falls_back_to_request_scheme_and_host() {
        let mut config = test_config();
        config.server_url = None;
        let headers = axum::http::HeaderMap::new();
        assert_eq!(
            canonical_base_url(&config, &headers, "http", "direct.example"),
            "http://direct.example"
        );
    }

    fn test_config() -> AppConfig {
        AppConfig {
            jwt_secret: "s".into(),
            jwt_algorithm: "HS256".into(),
            access_token_expires: std::time::Duration::from_secs(3600),
            auth_code_expires: std::time::Duration::from_secs(600),
            session_secret: "s".into(),
            default_scope: "full-access".into(),
            oauth_resource_path: "/v2/mcp".into(),
            legacy_mount: "/v1/mcp".into(),
            server_url: None,
            client_meta: fingate_core::config::ClientMetaConfig::default(),
            storage_dir: None,
            storage_encryption_key: None,
            upstream_credential_env_var: "EODHD_API_KEY".into(),
            upstream_api_base: "https://eodhd.com".into(),
            upstream_api_timeout: std::time::Duration::from_secs(30),
            identity_verify_timeout: std::time::Duration::from_secs(10),
            bind_addr: "0.0.0.0:8080".into(),
            log_format: fingate_core::config::LogFormat::Pretty,
        }
    }
}
