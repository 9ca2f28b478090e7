//! Legacy Identity middleware: extracts a raw upstream credential from headers or query
//! parameters on the legacy mount. There is no failure mode here — absence is reported
//! later by the Upstream Credential Sink.

use crate::request_context::RequestCredential;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

const QUERY_PARAM_NAMES: [&str; 4] = ["apikey", "api_key", "api-key", "api_token"];

pub async fn legacy_identity_middleware(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<RequestCredential>().is_none() {
        if let Some(credential) = resolve_credential(request.headers(), request.uri().query()) {
            request.extensions_mut().insert(RequestCredential(credential));
        }
    }
    next.run(request).await
}

fn resolve_credential(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    if let Some(bearer) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        if !bearer.is_empty() {
            return Some(bearer.to_string());
        }
    }

    if let Some(api_key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        if !api_key.is_empty() {
            return Some(api_key.to_string());
        }
    }

    let query = query?;
    let params: std::collections::HashMap<_, _> = url::form_urlencoded::parse(query.as_bytes()).collect();
    for name in QUERY_PARAM_NAMES {
        if let Some(value) = params.get(name) {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_bearer_over_query_params() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer raw-credential".parse().unwrap(),
        );
        let resolved = resolve_credential(&headers, Some("apikey=from-query"));
        assert_eq!(resolved.as_deref(), Some("raw-credential"));
    }

    #[test]
    fn falls_back_to_x_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "header-credential".parse().unwrap());
        assert_eq!(
            resolve_credential(&headers, None).as_deref(),
            Some("header-credential")
        );
    }

    #[test]
    fn falls_back_to_query_params_in_declared_order() {
        let headers = HeaderMap::new();
        assert_eq!(
            resolve_credential(&headers, Some("api_key=second")).as_deref(),
            Some("second")
        );
        assert_eq!(
            resolve_credential(&headers, Some("apikey=first&api_key=second")).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn returns_none_when_nothing_present() {
        let headers = HeaderMap::new();
        assert_eq!(resolve_credential(&headers, None), None);
    }
}
