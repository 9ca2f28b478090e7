//! Identifier and secure-random-string generation shared across the OAuth flows.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A new opaque id suitable for client ids, auth codes, and access-token jti claims.
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// A cryptographically secure random alphanumeric string of the given length, used for
/// client secrets, session ids, and the OAuth `state`/PKCE `code_verifier` parameters
/// when this side is generating them rather than echoing the caller's.
pub fn generate_secure_random(length: usize) -> String {
    use rand::Rng;
    let charset = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..charset.len());
            charset[idx] as char
        })
        .collect()
}

/// SHA-256 hex digest, used to key the Store's `access_tokens` and `credential_index`
/// collections by hash rather than by raw secret value.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{:02x}", b).expect("writing to a String never fails");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_uuid_is_unique_and_well_formed() {
        let a = generate_uuid();
        let b = generate_uuid();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
        assert!(a.contains('-'));
    }

    #[test]
    fn generate_secure_random_respects_length_and_charset() {
        let s = generate_secure_random(40);
        assert_eq!(s.len(), 40);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn sha256_hex_is_deterministic_and_distinct() {
        let a = sha256_hex("secret-one");
        let b = sha256_hex("secret-one");
        let c = sha256_hex("secret-two");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
