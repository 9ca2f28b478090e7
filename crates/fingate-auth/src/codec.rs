//! Issuance and verification of compact signed tokens (HMAC-SHA-256 JWT by default).
//!
//! Audience is deliberately **not** checked by this layer: `aud` may be a string or an
//! array and must be compared with trailing-slash tolerance, which the protected-resource
//! middleware does itself after decoding (see `pr_middleware`). Signature-only validity is
//! never sufficient for authorization — callers must additionally confirm Store
//! membership (I1).

use crate::error::AuthError;
use crate::types::TokenClaims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
        }
    }

    pub fn issue(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let header = Header::new(self.algorithm);
        Ok(encode(&header, claims, &self.encoding_key)?)
    }

    /// Checks signature and `exp` only. `aud` is the caller's responsibility.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_aud = false;
        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Audience;
    use fingate_core::clock::now_unix;
    use fingate_core::ids::generate_uuid;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            iss: "https://gateway.example".into(),
            sub: "alice@example.com".into(),
            aud: Audience::Single("https://gateway.example/v2/mcp".into()),
            client_id: "client-1".into(),
            scope: "full-access".into(),
            iat: now_unix(),
            exp: now_unix() + 3600,
            jti: generate_uuid(),
        }
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let codec = TokenCodec::new("test-secret", Algorithm::HS256);
        let claims = sample_claims();
        let token = codec.issue(&claims).unwrap();
        let decoded = codec.verify(&token).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.client_id, claims.client_id);
    }

    #[test]
    fn verify_rejects_token_signed_with_a_different_secret() {
        let codec_a = TokenCodec::new("secret-a", Algorithm::HS256);
        let codec_b = TokenCodec::new("secret-b", Algorithm::HS256);
        let token = codec_a.issue(&sample_claims()).unwrap();
        assert!(codec_b.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let codec = TokenCodec::new("test-secret", Algorithm::HS256);
        let mut claims = sample_claims();
        claims.iat = now_unix() - 7200;
        claims.exp = now_unix() - 3600;
        let token = codec.issue(&claims).unwrap();
        assert!(codec.verify(&token).is_err());
    }
}
