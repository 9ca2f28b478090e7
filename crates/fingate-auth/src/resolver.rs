//! Resolves a URL-shaped `client_id` ("Client ID Metadata Document") into a
//! `RegisteredClient`, with SSRF protection and bounded, TTL-clamped caching.

use crate::error::AuthError;
use crate::store::{Collection, Store, StoreExt};
use crate::types::{RegisteredClient, TokenAuthMethod};
use fingate_core::clock::now_unix;
use fingate_core::config::ClientMetaConfig;
use reqwest::redirect::Policy;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub struct ClientMetadataResolver {
    http: reqwest::Client,
    store: Arc<dyn Store>,
    config: ClientMetaConfig,
}

impl ClientMetadataResolver {
    pub fn new(store: Arc<dyn Store>, config: ClientMetaConfig) -> Self {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(config.http_timeout)
            .build()
            .expect("building the client-metadata HTTP client cannot fail for this config");
        Self { http, store, config }
    }

    pub async fn resolve(&self, client_id_url: &str) -> Result<RegisteredClient, AuthError> {
        let url = validate_url_shape(client_id_url)?;

        // `client_id == client_id_url` (I4), so the registered client is cached under the
        // same key it's looked up by; the store's own TTL expiry is what ages it out.
        if let Some(cached) = self.store.get::<RegisteredClient>(Collection::Clients, client_id_url).await? {
            return Ok(cached);
        }

        guard_against_ssrf(&url).await?;

        let response = self
            .http
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::MetadataFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::MetadataFetchFailed(format!(
                "non-200 status: {}",
                response.status()
            )));
        }

        let ttl = cache_control_ttl(&response, &self.config);
        let body = read_capped_body(response, self.config.max_bytes).await?;
        let document: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| AuthError::MetadataFetchFailed(e.to_string()))?;

        let client = parse_client_metadata(&document, client_id_url)?;

        // `client_id == client_id_url` (I4), so caching under `client.client_id` already
        // caches it under the URL we looked up by; no separate cache-entry write needed.
        self.store
            .put(Collection::Clients, &client.client_id, &client, Some(ttl))
            .await?;

        Ok(client)
    }
}

fn validate_url_shape(raw: &str) -> Result<Url, AuthError> {
    let url = Url::parse(raw).map_err(|_| AuthError::InvalidClient("client_id is not a well-formed URL".into()))?;
    if url.scheme() != "https" {
        return Err(AuthError::InvalidClient("client_id URL must use https".into()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AuthError::InvalidClient("client_id URL must have a host".into()));
    }
    if url.path().is_empty() || url.path() == "/" {
        return Err(AuthError::InvalidClient("client_id URL must have a non-root path".into()));
    }
    if url.fragment().is_some() {
        return Err(AuthError::InvalidClient("client_id URL must not have a fragment".into()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(AuthError::InvalidClient("client_id URL must not carry userinfo".into()));
    }
    if url.path_segments().into_iter().flatten().any(|seg| seg == "." || seg == "..") {
        return Err(AuthError::InvalidClient(
            "client_id URL path must not contain dot segments".into(),
        ));
    }
    Ok(url)
}

async fn guard_against_ssrf(url: &Url) -> Result<(), AuthError> {
    let host = url.host_str().expect("validated non-empty host");
    let port = url.port_or_known_default().unwrap_or(443);
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AuthError::SsrfRejected(format!("DNS resolution failed: {e}")))?;

    let mut saw_any = false;
    for addr in addrs {
        saw_any = true;
        if !is_globally_routable(addr.ip()) {
            return Err(AuthError::SsrfRejected(format!(
                "{} resolves to a non-globally-routable address",
                host
            )));
        }
    }
    if !saw_any {
        return Err(AuthError::SsrfRejected(format!("{host} did not resolve to any address")));
    }
    Ok(())
}

fn is_globally_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_v4_globally_routable(v4),
        IpAddr::V6(v6) => {
            // Reject IPv4-mapped/IPv4-compatible addresses by their mapped IPv4 meaning,
            // not their IPv6 shape, else `::ffff:127.0.0.1` would sail past the v6 checks
            // below and reqwest would still connect to loopback.
            if let Some(v4) = v6.to_ipv4_mapped().or_else(|| v6.to_ipv4()) {
                return is_v4_globally_routable(v4);
            }
            !(v6.is_loopback() || v6.is_multicast() || v6.is_unspecified() || is_unique_local(v6) || is_unicast_link_local(v6))
        }
    }
}

fn is_v4_globally_routable(v4: std::net::Ipv4Addr) -> bool {
    !(v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_multicast()
        || v4.is_broadcast()
        || v4.is_unspecified()
        || v4.is_documentation()
        || v4.is_reserved()
        || v4.octets()[0] == 0
        || is_shared_address_space(v4))
}

fn is_shared_address_space(v4: std::net::Ipv4Addr) -> bool {
    let octets = v4.octets();
    octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000
}

fn is_unique_local(v6: std::net::Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xfe00) == 0xfc00
}

fn is_unicast_link_local(v6: std::net::Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xffc0) == 0xfe80
}

fn cache_control_ttl(response: &reqwest::Response, config: &ClientMetaConfig) -> Duration {
    let max_age = response
        .headers()
        .get(reqwest::header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| {
            value
                .split(',')
                .map(str::trim)
                .find_map(|directive| directive.strip_prefix("max-age="))
                .and_then(|secs| secs.parse::<u64>().ok())
        });

    match max_age {
        Some(secs) => Duration::from_secs(secs).clamp(config.min_ttl, config.max_ttl),
        None => config.default_ttl,
    }
}

async fn read_capped_body(response: reqwest::Response, max_bytes: usize) -> Result<Vec<u8>, AuthError> {
    use futures::StreamExt;
    let mut stream = response.bytes_stream();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AuthError::MetadataFetchFailed(e.to_string()))?;
        if body.len() + chunk.len() > max_bytes {
            return Err(AuthError::MetadataFetchFailed(format!(
                "response body exceeded {max_bytes} byte cap"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn parse_client_metadata(document: &serde_json::Value, client_id_url: &str) -> Result<RegisteredClient, AuthError> {
    let obj = document
        .as_object()
        .ok_or_else(|| AuthError::InvalidClient("client metadata document is not a JSON object".into()))?;

    let doc_client_id = obj
        .get("client_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::InvalidClient("client metadata document is missing client_id".into()))?;
    if doc_client_id != client_id_url {
        return Err(AuthError::InvalidClient(
            "client metadata document client_id does not match the requested URL".into(),
        ));
    }

    let redirect_uris: Vec<String> = obj
        .get("redirect_uris")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();
    if redirect_uris.is_empty() {
        return Err(AuthError::InvalidClient(
            "client metadata document must declare a non-empty redirect_uris list".into(),
        ));
    }

    if let Some(method) = obj.get("token_endpoint_auth_method").and_then(|v| v.as_str()) {
        if !method.is_empty() && method != "none" {
            return Err(AuthError::InvalidClient(
                "discovered clients must use token_endpoint_auth_method=none".into(),
            ));
        }
    }

    let client_name = obj
        .get("client_name")
        .and_then(|v| v.as_str())
        .unwrap_or("unnamed client")
        .to_string();

    Ok(RegisteredClient {
        client_id: client_id_url.to_string(),
        client_secret: None,
        redirect_uris,
        client_name,
        grant_types: vec!["authorization_code".to_string()],
        response_types: vec!["code".to_string()],
        token_auth_method: TokenAuthMethod::None,
        created_at: now_unix(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_http_scheme() {
        assert!(validate_url_shape("http://example.test/client.json").is_err());
    }

    #[test]
    fn rejects_root_path() {
        assert!(validate_url_shape("https://example.test").is_err());
        assert!(validate_url_shape("https://example.test/").is_err());
    }

    #[test]
    fn rejects_dot_segments() {
        assert!(validate_url_shape("https://example.test/a/../client.json").is_err());
    }

    #[test]
    fn accepts_well_formed_url() {
        assert!(validate_url_shape("https://example.test/client.json").is_ok());
    }

    #[test]
    fn loopback_and_private_addresses_are_rejected() {
        assert!(!is_globally_routable("127.0.0.1".parse().unwrap()));
        assert!(!is_globally_routable("10.0.0.5".parse().unwrap()));
        assert!(!is_globally_routable("192.168.1.1".parse().unwrap()));
        assert!(!is_globally_routable("169.254.1.1".parse().unwrap()));
        assert!(!is_globally_routable("::1".parse().unwrap()));
    }

    #[test]
    fn public_addresses_are_accepted() {
        assert!(is_globally_routable("93.184.216.34".parse().unwrap()));
    }

    #[test]
    fn ipv4_mapped_loopback_is_rejected() {
        assert!(!is_globally_routable("::ffff:127.0.0.1".parse().unwrap()));
        assert!(!is_globally_routable("::ffff:10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn reserved_and_zero_net_v4_addresses_are_rejected() {
        assert!(!is_globally_routable("240.0.0.1".parse().unwrap()));
        assert!(!is_globally_routable("0.0.0.5".parse().unwrap()));
    }

    #[test]
    fn parses_well_formed_metadata_document() {
        let doc = serde_json::json!({
            "client_id": "https://example.test/client.json",
            "redirect_uris": ["https://app.test/cb"],
            "token_endpoint_auth_method": "none",
            "client_name": "X",
        });
        let client = parse_client_metadata(&doc, "https://example.test/client.json").unwrap();
        assert!(client.is_public());
        assert_eq!(client.redirect_uris, vec!["https://app.test/cb".to_string()]);
    }

    #[test]
    fn rejects_metadata_document_with_mismatched_client_id() {
        let doc = serde_json::json!({
            "client_id": "https://other.test/client.json",
            "redirect_uris": ["https://app.test/cb"],
        });
        assert!(parse_client_metadata(&doc, "https://example.test/client.json").is_err());
    }

    #[test]
    fn rejects_metadata_document_requesting_a_secret_based_auth_method() {
        let doc = serde_json::json!({
            "client_id": "https://example.test/client.json",
            "redirect_uris": ["https://app.test/cb"],
            "token_endpoint_auth_method": "client_secret_post",
        });
        assert!(parse_client_metadata(&doc, "https://example.test/client.json").is_err());
    }
}
