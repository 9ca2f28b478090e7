use super::{Collection, Store};
use crate::error::AuthError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use rand::RngCore;
use std::time::Duration;

const NONCE_LEN: usize = 12;

/// Decorator that seals value bytes with AES-256-GCM before delegating to an inner
/// `Store`. The key comes from configuration (`OAUTH_STORAGE_ENCRYPTION_KEY`); the key
/// itself is never persisted by this layer. Collection names and keys are left in the
/// clear since the inner backend indexes by them.
pub struct EncryptedStore<S: Store> {
    inner: S,
    cipher: Aes256Gcm,
}

impl<S: Store> EncryptedStore<S> {
    /// `key` must be exactly 32 bytes (AES-256). Callers typically derive this with
    /// `sha256_hex` on a passphrase and decode the hex back to bytes, or require the
    /// operator to supply 32 raw bytes directly.
    pub fn new(inner: S, key: &[u8; 32]) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        Self { inner, cipher }
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AuthError::Storage(format!("encryption failed: {e}")))?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, AuthError> {
        if sealed.len() < NONCE_LEN {
            return Err(AuthError::Storage("sealed value too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AuthError::Storage(format!("decryption failed: {e}")))
    }
}

#[async_trait]
impl<S: Store> Store for EncryptedStore<S> {
    async fn put_raw(
        &self,
        collection: Collection,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), AuthError> {
        let sealed = self.seal(&value)?;
        self.inner.put_raw(collection, key, sealed, ttl).await
    }

    async fn get_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        match self.inner.get_raw(collection, key).await? {
            Some(sealed) => Ok(Some(self.open(&sealed)?)),
            None => Ok(None),
        }
    }

    async fn delete_raw(&self, collection: Collection, key: &str) -> Result<(), AuthError> {
        self.inner.delete_raw(collection, key).await
    }

    async fn consume_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        match self.inner.consume_raw(collection, key).await? {
            Some(sealed) => Ok(Some(self.open(&sealed)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::StoreExt;

    #[tokio::test]
    async fn round_trips_through_encryption() {
        let key = [7u8; 32];
        let store = EncryptedStore::new(MemoryStore::new(), &key);
        store
            .put(Collection::Users, "bob@example.com", &"secret-payload", None)
            .await
            .unwrap();
        let value: Option<String> = store.get(Collection::Users, "bob@example.com").await.unwrap();
        assert_eq!(value.as_deref(), Some("secret-payload"));
    }

    #[tokio::test]
    async fn wrong_key_fails_to_decrypt() {
        let store = EncryptedStore::new(MemoryStore::new(), &[7u8; 32]);
        store
            .put(Collection::Users, "k", &"plaintext-marker", None)
            .await
            .unwrap();
        let sealed = store.inner.get_raw(Collection::Users, "k").await.unwrap().unwrap();
        let wrong_key_view = EncryptedStore::new(MemoryStore::new(), &[9u8; 32]);
        assert!(wrong_key_view.open(&sealed).is_err());
    }
}
