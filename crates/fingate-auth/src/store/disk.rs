use super::{Collection, Store};
use crate::error::AuthError;
use async_trait::async_trait;
use fingate_core::clock::{is_expired, now_unix};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Serialize, Deserialize)]
struct DiskEntry {
    #[serde(with = "base64_bytes")]
    bytes: Vec<u8>,
    expires_at: Option<i64>,
}

/// On-disk backend: one shard directory per collection, one file per key. A process-wide
/// lock serializes read-modify-write sequences so `consume` stays atomic within this
/// process (the only concurrency domain the spec requires).
pub struct DiskStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl DiskStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, AuthError> {
        let root = root.as_ref().to_path_buf();
        for collection in Collection::all() {
            let shard = root.join(collection.name());
            tokio::fs::create_dir_all(&shard)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    fn path_for(&self, collection: Collection, key: &str) -> PathBuf {
        self.root.join(collection.name()).join(format!("{key}.json"))
    }

    async fn read_live(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let path = self.path_for(collection, key);
        match tokio::fs::read(&path).await {
            Ok(raw) => {
                let entry: DiskEntry =
                    serde_json::from_slice(&raw).map_err(|e| AuthError::Storage(e.to_string()))?;
                if entry.expires_at.is_some_and(is_expired) {
                    let _ = tokio::fs::remove_file(&path).await;
                    Ok(None)
                } else {
                    Ok(Some(entry.bytes))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[async_trait]
impl Store for DiskStore {
    async fn put_raw(
        &self,
        collection: Collection,
        key: &str,
        value: Vec<u8>,
        ttl: Option<std::time::Duration>,
    ) -> Result<(), AuthError> {
        let _guard = self.lock.lock().await;
        let entry = DiskEntry {
            bytes: value,
            expires_at: ttl.map(|d| now_unix() + d.as_secs() as i64),
        };
        let raw = serde_json::to_vec(&entry)?;
        tokio::fs::write(self.path_for(collection, key), raw)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    async fn get_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let _guard = self.lock.lock().await;
        self.read_live(collection, key).await
    }

    async fn delete_raw(&self, collection: Collection, key: &str) -> Result<(), AuthError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(self.path_for(collection, key)).await {
            Ok(()) | Err(_) => Ok(()),
        }
    }

    async fn consume_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let _guard = self.lock.lock().await;
        let value = self.read_live(collection, key).await?;
        let _ = tokio::fs::remove_file(self.path_for(collection, key)).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreExt;

    #[tokio::test]
    async fn put_then_get_survives_a_fresh_handle_on_the_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        store
            .put(Collection::Clients, "client-1", &"registered", None)
            .await
            .unwrap();
        drop(store);

        let reopened = DiskStore::open(dir.path()).await.unwrap();
        let value: Option<String> = reopened.get(Collection::Clients, "client-1").await.unwrap();
        assert_eq!(value.as_deref(), Some("registered"));
    }

    #[tokio::test]
    async fn consume_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).await.unwrap();
        store
            .put(Collection::AuthCodes, "code-1", &"payload", None)
            .await
            .unwrap();
        let first: Option<String> = store.consume(Collection::AuthCodes, "code-1").await.unwrap();
        let second: Option<String> = store.consume(Collection::AuthCodes, "code-1").await.unwrap();
        assert_eq!(first.as_deref(), Some("payload"));
        assert!(second.is_none());
    }
}
