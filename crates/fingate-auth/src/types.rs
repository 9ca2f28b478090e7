//! Entities held in the Token Store. Each is a plain value record; mutation only ever
//! happens through a `Store` operation, never in place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAuthMethod {
    None,
    ClientSecretPost,
    ClientSecretBasic,
}

impl TokenAuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenAuthMethod::None => "none",
            TokenAuthMethod::ClientSecretPost => "client_secret_post",
            TokenAuthMethod::ClientSecretBasic => "client_secret_basic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::None),
            "client_secret_post" => Some(Self::ClientSecretPost),
            "client_secret_basic" => Some(Self::ClientSecretBasic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uris: Vec<String>,
    pub client_name: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_auth_method: TokenAuthMethod,
    pub created_at: i64,
}

impl RegisteredClient {
    pub fn is_public(&self) -> bool {
        matches!(self.token_auth_method, TokenAuthMethod::None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub user_id: String,
    pub scopes: Vec<String>,
    pub resource: String,
    pub expires_at: i64,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub client_id: String,
    pub user_id: String,
    pub scopes: Vec<String>,
    pub expires_at: i64,
    pub issued_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub upstream_credential: String,
    pub name: String,
    pub subscription_type: String,
    pub scopes: Vec<String>,
    pub created_at: i64,
}

/// The audience claim may be a single string or a list on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// True if any member equals `expected` after stripping a single trailing slash
    /// from both sides.
    pub fn matches(&self, expected: &str) -> bool {
        let expected = expected.trim_end_matches('/');
        match self {
            Audience::Single(aud) => aud.trim_end_matches('/') == expected,
            Audience::Many(auds) => auds.iter().any(|a| a.trim_end_matches('/') == expected),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub client_id: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl TokenClaims {
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split(' ').filter(|s| !s.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_matches_tolerates_trailing_slash_both_sides() {
        let aud = Audience::Single("https://gateway.example/v2/mcp/".to_string());
        assert!(aud.matches("https://gateway.example/v2/mcp"));
    }

    #[test]
    fn audience_matches_rejects_unrelated_resource() {
        let aud = Audience::Single("https://gateway.example/v3/mcp".to_string());
        assert!(!aud.matches("https://gateway.example/v2/mcp"));
    }

    #[test]
    fn audience_many_matches_if_any_element_matches() {
        let aud = Audience::Many(vec![
            "https://other.example/x".to_string(),
            "https://gateway.example/v2/mcp".to_string(),
        ]);
        assert!(aud.matches("https://gateway.example/v2/mcp"));
    }

    #[test]
    fn public_client_has_no_secret() {
        let client = RegisteredClient {
            client_id: "abc".into(),
            client_secret: None,
            redirect_uris: vec!["http://localhost:3000/cb".into()],
            client_name: "Test".into(),
            grant_types: vec!["authorization_code".into()],
            response_types: vec!["code".into()],
            token_auth_method: TokenAuthMethod::None,
            created_at: 0,
        };
        assert!(client.is_public());
    }
}
