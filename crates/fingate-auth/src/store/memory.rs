use super::{Collection, Store};
use crate::error::AuthError;
use async_trait::async_trait;
use fingate_core::clock::{is_expired, now_unix};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<i64>,
}

impl Entry {
    fn is_live(&self) -> bool {
        !self.expires_at.is_some_and(is_expired)
    }
}

/// In-memory backend. Default backend; entries are pruned lazily on read per I1.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<(Collection, String), Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_raw(
        &self,
        collection: Collection,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), AuthError> {
        let expires_at = ttl.map(|d| now_unix() + d.as_secs() as i64);
        let mut data = self.data.lock().expect("memory store mutex poisoned");
        data.insert(
            (collection, key.to_string()),
            Entry {
                bytes: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn get_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let mut data = self.data.lock().expect("memory store mutex poisoned");
        match data.get(&(collection, key.to_string())) {
            Some(entry) if entry.is_live() => Ok(Some(entry.bytes.clone())),
            Some(_) => {
                data.remove(&(collection, key.to_string()));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_raw(&self, collection: Collection, key: &str) -> Result<(), AuthError> {
        let mut data = self.data.lock().expect("memory store mutex poisoned");
        data.remove(&(collection, key.to_string()));
        Ok(())
    }

    async fn consume_raw(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let mut data = self.data.lock().expect("memory store mutex poisoned");
        match data.remove(&(collection, key.to_string())) {
            Some(entry) if entry.is_live() => Ok(Some(entry.bytes)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreExt;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .put(Collection::Users, "alice@example.com", &"alice", None)
            .await
            .unwrap();
        let value: Option<String> = store.get(Collection::Users, "alice@example.com").await.unwrap();
        assert_eq!(value.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_not_found() {
        let store = MemoryStore::new();
        store
            .put_raw(
                Collection::AuthCodes,
                "c1",
                b"\"code\"".to_vec(),
                Some(Duration::from_secs(0)),
            )
            .await
            .unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let value: Option<String> = store.get(Collection::AuthCodes, "c1").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn consume_is_single_use() {
        let store = MemoryStore::new();
        store
            .put(Collection::AuthCodes, "c1", &"payload", None)
            .await
            .unwrap();
        let first: Option<String> = store.consume(Collection::AuthCodes, "c1").await.unwrap();
        let second: Option<String> = store.consume(Collection::AuthCodes, "c1").await.unwrap();
        assert_eq!(first.as_deref(), Some("payload"));
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn consume_under_concurrency_yields_exactly_one_winner() {
        use std::sync::Arc;
        let store = Arc::new(MemoryStore::new());
        store
            .put(Collection::AuthCodes, "shared", &"payload", None)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .consume::<String>(Collection::AuthCodes, "shared")
                    .await
                    .unwrap()
            }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
