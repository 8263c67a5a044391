//! # Local Filesystem Backend
//!
//! Layout under the bucket root:
//!
//! ```text
//! objects/<b64(key)>        object body
//! meta/<b64(key)>.json      content type and checksum
//! tmp/                      in-flight writes, renamed into place
//! ```
//!
//! Encoding the key keeps the namespace flat, so keys ending in `/`
//! (folder placeholders) and keys that are prefixes of other keys coexist.
//!
//! Encoded names do not sort like keys, so every list call reads the whole
//! `meta/` directory and keeps only the keys under the requested prefix.
//! Deleting a folder of N objects therefore reads about N * N / page_limit
//! directory entries. Suitable for small buckets; large ones want the
//! memory backend or a real object store.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

use super::backend::{ListRequest, ListingPage, ObjectEntry, ObjectStore, StoredObject, MAX_KEYS};
use super::errors::{StorageError, StorageResult};
use super::listing::paginate;

const MAX_FILE_NAME: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectMeta {
    content_type: String,
    checksum: String,
    last_modified: DateTime<Utc>,
}

/// Local filesystem storage backend
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
    page_limit: usize,
}

impl LocalBackend {
    /// Open (creating if needed) a bucket rooted at `root`
    pub async fn open(root: PathBuf) -> StorageResult<Self> {
        for dir in ["objects", "meta", "tmp"] {
            let path = root.join(dir);
            fs::create_dir_all(&path)
                .await
                .map_err(|e| StorageError::from_io(&path.display().to_string(), e))?;
        }

        Ok(Self {
            root,
            page_limit: MAX_KEYS,
        })
    }

    /// Cap the number of keys returned per list call
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.clamp(1, MAX_KEYS);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn encode_key(key: &str) -> StorageResult<String> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let name = URL_SAFE_NO_PAD.encode(key.as_bytes());
        // Room for the ".json" suffix of the sidecar
        if name.len() + 5 > MAX_FILE_NAME {
            return Err(StorageError::InvalidKey(format!("key too long: {} bytes", key.len())));
        }
        Ok(name)
    }

    fn decode_name(name: &str) -> Option<String> {
        let bytes = URL_SAFE_NO_PAD.decode(name).ok()?;
        String::from_utf8(bytes).ok()
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join("objects").join(name)
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.root.join("meta").join(format!("{}.json", name))
    }

    async fn write_atomic(&self, target: &Path, data: &[u8], key: &str) -> StorageResult<()> {
        let tmp = self.root.join("tmp").join(Uuid::new_v4().to_string());
        fs::write(&tmp, data)
            .await
            .map_err(|e| StorageError::from_io(key, e))?;
        fs::rename(&tmp, target)
            .await
            .map_err(|e| StorageError::from_io(key, e))
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let name = Self::encode_key(key)?;
        for path in [self.meta_path(&name), self.object_path(&name)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::from_io(key, e)),
            }
        }
        Ok(())
    }

    async fn read_meta(&self, name: &str, key: &str) -> StorageResult<ObjectMeta> {
        let raw = fs::read(self.meta_path(name))
            .await
            .map_err(|e| StorageError::from_io(key, e))?;
        serde_json::from_slice(&raw)
            .map_err(|e| StorageError::Internal(format!("corrupt metadata for {}: {}", key, e)))
    }

    /// Stored keys starting with `prefix`, in ascending order
    async fn keys(&self, prefix: &str) -> StorageResult<BTreeSet<String>> {
        let dir = self.root.join("meta");
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::from_io(&dir.display().to_string(), e))?;

        let mut keys = BTreeSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io(&dir.display().to_string(), e))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Some(key) = Self::decode_name(name).filter(|k| k.starts_with(prefix)) {
                keys.insert(key);
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStore for LocalBackend {
    async fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> StorageResult<()> {
        let name = Self::encode_key(key)?;
        let meta = ObjectMeta {
            content_type: content_type.to_string(),
            checksum: format!("{:x}", Sha256::digest(body)),
            last_modified: Utc::now(),
        };
        let meta_json = serde_json::to_vec(&meta)
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        // Body first: a key is visible once its sidecar exists
        self.write_atomic(&self.object_path(&name), body, key).await?;
        self.write_atomic(&self.meta_path(&name), &meta_json, key).await
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let name = Self::encode_key(key)?;
        let meta = self.read_meta(&name, key).await?;
        let body = fs::read(self.object_path(&name))
            .await
            .map_err(|e| StorageError::from_io(key, e))?;

        Ok(StoredObject {
            key: key.to_string(),
            body,
            content_type: meta.content_type,
            checksum: meta.checksum,
            last_modified: meta.last_modified,
        })
    }

    async fn list_objects(&self, request: &ListRequest) -> StorageResult<ListingPage> {
        let keys = self.keys(&request.prefix).await?;
        let plan = paginate(keys.iter().map(String::as_str), request, self.page_limit)?;

        let mut objects = Vec::with_capacity(plan.object_keys.len());
        for key in plan.object_keys {
            let name = Self::encode_key(&key)?;
            let stat = match fs::metadata(self.object_path(&name)).await {
                Ok(stat) => stat,
                // Deleted between the directory scan and now
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::from_io(&key, e)),
            };
            let last_modified = stat
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            objects.push(ObjectEntry {
                size: stat.len(),
                last_modified,
                key,
            });
        }

        Ok(ListingPage {
            objects,
            common_prefixes: plan.common_prefixes,
            next_continuation_token: plan.next_continuation_token,
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.remove(key).await
    }

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<()> {
        if keys.len() > MAX_KEYS {
            return Err(StorageError::Internal(format!(
                "batch of {} keys exceeds {}",
                keys.len(),
                MAX_KEYS
            )));
        }
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
