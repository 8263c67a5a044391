//! # In-Memory Backend
//!
//! A bucket held in a `BTreeMap`. Contents vanish with the process.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::backend::{ListRequest, ListingPage, ObjectEntry, ObjectStore, StoredObject, MAX_KEYS};
use super::errors::{StorageError, StorageResult};
use super::listing::paginate;

#[derive(Debug, Clone)]
struct MemoryObject {
    body: Vec<u8>,
    content_type: String,
    checksum: String,
    last_modified: DateTime<Utc>,
}

/// In-memory storage backend
#[derive(Debug)]
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, MemoryObject>>,
    page_limit: usize,
}

impl MemoryBackend {
    /// Create an empty backend returning pages of up to 1000 keys
    pub fn new() -> Self {
        Self::with_page_limit(MAX_KEYS)
    }

    /// Create an empty backend with a smaller page size
    pub fn with_page_limit(page_limit: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_limit: page_limit.clamp(1, MAX_KEYS),
        }
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is stored
    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .map(|o| o.contains_key(key))
            .unwrap_or(false)
    }

    fn poisoned() -> StorageError {
        StorageError::Internal("memory backend lock poisoned".to_string())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let object = MemoryObject {
            body: body.to_vec(),
            content_type: content_type.to_string(),
            checksum: format!("{:x}", Sha256::digest(body)),
            last_modified: Utc::now(),
        };

        let mut objects = self.objects.write().map_err(|_| Self::poisoned())?;
        objects.insert(key.to_string(), object);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))?;

        Ok(StoredObject {
            key: key.to_string(),
            body: object.body.clone(),
            content_type: object.content_type.clone(),
            checksum: object.checksum.clone(),
            last_modified: object.last_modified,
        })
    }

    async fn list_objects(&self, request: &ListRequest) -> StorageResult<ListingPage> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        let plan = paginate(
            objects.range(request.prefix.clone()..).map(|(k, _)| k.as_str()),
            request,
            self.page_limit,
        )?;

        let entries = plan
            .object_keys
            .into_iter()
            .filter_map(|key| {
                objects.get(&key).map(|o| ObjectEntry {
                    size: o.body.len() as u64,
                    last_modified: o.last_modified,
                    key,
                })
            })
            .collect();

        Ok(ListingPage {
            objects: entries,
            common_prefixes: plan.common_prefixes,
            next_continuation_token: plan.next_continuation_token,
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let mut objects = self.objects.write().map_err(|_| Self::poisoned())?;
        objects.remove(key);
        Ok(())
    }

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<()> {
        if keys.len() > MAX_KEYS {
            return Err(StorageError::Internal(format!(
                "batch of {} keys exceeds {}",
                keys.len(),
                MAX_KEYS
            )));
        }

        let mut objects = self.objects.write().map_err(|_| Self::poisoned())?;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let backend = MemoryBackend::new();
        backend.put_object("a/b.json", b"{}", "application/json").await.unwrap();

        let object = backend.get_object("a/b.json").await.unwrap();
        assert_eq!(object.body, b"{}");
        assert_eq!(object.content_type, "application/json");
        assert_eq!(object.checksum.len(), 64);
    }

    #[tokio::test]
    async fn test_not_found() {
        let backend = MemoryBackend::new();
        let result = backend.get_object("missing").await;
        assert!(matches!(result, Err(StorageError::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let backend = MemoryBackend::new();
        backend.delete_object("missing").await.unwrap();
        backend.delete_objects(&["x".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_respects_page_limit() {
        let backend = MemoryBackend::with_page_limit(2);
        for key in ["p/1", "p/2", "p/3", "q/1"] {
            backend.put_object(key, b"", "text/plain").await.unwrap();
        }

        let first = backend.list_objects(&ListRequest::recursive("p/")).await.unwrap();
        assert_eq!(first.keys(), vec!["p/1", "p/2"]);
        let token = first.next_continuation_token.clone();
        assert!(token.is_some());

        let second = backend
            .list_objects(&ListRequest::recursive("p/").with_token(token))
            .await
            .unwrap();
        assert_eq!(second.keys(), vec!["p/3"]);
        assert!(second.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let backend = MemoryBackend::new();
        let keys: Vec<String> = (0..=MAX_KEYS).map(|i| i.to_string()).collect();
        assert!(backend.delete_objects(&keys).await.is_err());
    }
}
