//! # Object Store Trait
//!
//! The storage collaborator every operation runs against. Keys form a flat
//! namespace; "folders" exist only as shared prefixes and as zero-byte
//! placeholder objects whose key ends with `/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::StorageResult;

/// Largest page a list call returns and largest batch a delete call accepts
pub const MAX_KEYS: usize = 1000;

/// Alias kept for call sites that reason about delete batches
pub const MAX_DELETE_BATCH: usize = MAX_KEYS;

/// Parameters of one list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: String,
    pub delimiter: Option<char>,
    pub continuation_token: Option<String>,
    pub max_keys: usize,
}

impl ListRequest {
    /// Recursive listing of everything under `prefix`
    pub fn recursive(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: None,
            continuation_token: None,
            max_keys: MAX_KEYS,
        }
    }

    /// One level of `prefix`, grouping deeper keys by `/`
    pub fn folder(prefix: impl Into<String>) -> Self {
        Self {
            delimiter: Some('/'),
            ..Self::recursive(prefix)
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

/// One object in a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Result of one list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub objects: Vec<ObjectEntry>,
    pub common_prefixes: Vec<String>,
    /// Present only when more pages remain
    pub next_continuation_token: Option<String>,
}

impl ListingPage {
    pub fn keys(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.key.clone()).collect()
    }
}

/// A fetched object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub checksum: String,
    pub last_modified: DateTime<Utc>,
}

/// Backend trait for object storage
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Write an object, replacing any existing one
    async fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> StorageResult<()>;

    /// Read an object
    async fn get_object(&self, key: &str) -> StorageResult<StoredObject>;

    /// List one page of keys
    async fn list_objects(&self, request: &ListRequest) -> StorageResult<ListingPage>;

    /// Delete one object; deleting a missing key succeeds
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] objects in one call
    async fn delete_objects(&self, keys: &[String]) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request_builders() {
        let req = ListRequest::folder("docs/").with_token(Some("t".into()));
        assert_eq!(req.delimiter, Some('/'));
        assert_eq!(req.max_keys, MAX_KEYS);
        assert_eq!(req.continuation_token.as_deref(), Some("t"));

        assert_eq!(ListRequest::recursive("docs/").delimiter, None);
    }
}
