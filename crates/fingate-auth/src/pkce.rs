//! PKCE (S256) challenge verification.

use base64::Engine;
use sha2::{Digest, Sha256};

pub const CHALLENGE_METHOD_S256: &str = "S256";

/// `BASE64URL_NOPAD(SHA256(code_verifier)) == code_challenge`, method fixed to S256.
pub fn verify(code_verifier: &str, code_challenge: &str) -> bool {
    let digest = Sha256::digest(code_verifier.as_bytes());
    let computed = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
    computed == code_challenge
}

pub fn challenge_from_verifier(code_verifier: &str) -> String {
    let digest = Sha256::digest(code_verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_pair() {
        let verifier = "abc.-_~0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghij";
        let challenge = challenge_from_verifier(verifier);
        assert!(verify(verifier, &challenge));
    }

    #[test]
    fn verify_rejects_mismatched_pair() {
        let verifier = "abc.-_~0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghij";
        assert!(!verify(verifier, "not-the-right-challenge"));
    }
}
