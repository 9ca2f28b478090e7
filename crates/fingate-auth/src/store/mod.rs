//! Typed, TTL-aware keyed storage for the five OAuth entity kinds.
//!
//! `Store` is the abstract interface; `MemoryStore` and `DiskStore` are the concrete
//! backends, and `EncryptedStore` layers authenticated encryption over either one as a
//! decorator (composition over inheritance — the wrapper is itself a `Store`).

pub mod disk;
pub mod encrypted;
pub mod memory;

use crate::error::AuthError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// The five named collections. `AccessTokens` and `CredentialIndex` are always keyed by
/// `sha256_hex(secret)`, never by the raw secret — see `fingate_core::ids::sha256_hex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    AuthCodes,
    AccessTokens,
    Users,
    CredentialIndex,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::AuthCodes => "auth_codes",
            Collection::AccessTokens => "access_tokens",
            Collection::Users => "users",
            Collection::CredentialIndex => "credential_index",
        }
    }

    pub fn all() -> [Collection; 5] {
        [
            Collection::Clients,
            Collection::AuthCodes,
            Collection::AccessTokens,
            Collection::Users,
            Collection::CredentialIndex,
        ]
    }
}

/// Raw byte-oriented storage contract. Callers go through `StoreExt` for typed access;
/// backends only need to implement this.
#[async_trait]
pub trait Store: Send + Sync {
    async fn put_raw(
        &self,
        collection: Collection,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), AuthError>;

    async fn get_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError>;

    async fn delete_raw(&self, collection: Collection, key: &str) -> Result<(), AuthError>;

    /// Atomically return-and-delete. At most one concurrent caller may observe `Some`.
    async fn consume_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError>;
}

/// Typed convenience layer over `Store`, implemented for every `Store` via JSON
/// encoding. Entities never need to know about byte encoding.
#[async_trait]
pub trait StoreExt: Store {
    async fn put<T: Serialize + Sync>(
        &self,
        collection: Collection,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), AuthError> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(collection, key, bytes, ttl).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, AuthError> {
        match self.get_raw(collection, key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<(), AuthError> {
        self.delete_raw(collection, key).await
    }

    async fn consume<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, AuthError> {
        match self.consume_raw(collection, key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
