//! Shared test fixtures: a store wrapper that records calls and can be told
//! to fail a specific list or batch-delete call.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use aerofiles::file_storage::{
    ListRequest, ListingPage, MemoryBackend, ObjectStore, StorageError, StorageResult, StoredObject,
};

/// Wraps a [`MemoryBackend`] and records list / batch-delete traffic
#[derive(Debug)]
pub struct RecordingStore {
    pub inner: Arc<MemoryBackend>,
    list_calls: AtomicUsize,
    delete_batches: Mutex<Vec<usize>>,
    /// 1-based index of the batch delete that fails
    fail_delete_at: Option<usize>,
    /// 1-based index of the list call that fails
    fail_list_at: Option<usize>,
}

impl RecordingStore {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        Self {
            inner,
            list_calls: AtomicUsize::new(0),
            delete_batches: Mutex::new(Vec::new()),
            fail_delete_at: None,
            fail_list_at: None,
        }
    }

    pub fn failing_delete_at(mut self, call: usize) -> Self {
        self.fail_delete_at = Some(call);
        self
    }

    pub fn failing_list_at(mut self, call: usize) -> Self {
        self.fail_list_at = Some(call);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Sizes of the batch deletes issued so far, failed ones included
    pub fn delete_batches(&self) -> Vec<usize> {
        self.delete_batches.lock().unwrap().clone()
    }
}

/// Memory backend returning at most `page_limit` keys per list call
pub async fn seeded_backend(page_limit: usize, keys: &[&str]) -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::with_page_limit(page_limit));
    for key in keys {
        backend.put_object(key, b"x", "text/plain").await.unwrap();
    }
    backend
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> StorageResult<()> {
        self.inner.put_object(key, body, content_type).await
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        self.inner.get_object(key).await
    }

    async fn list_objects(&self, request: &ListRequest) -> StorageResult<ListingPage> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_list_at == Some(call) {
            return Err(StorageError::Unavailable("injected list failure".into()));
        }
        self.inner.list_objects(request).await
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.inner.delete_object(key).await
    }

    async fn delete_objects(&self, keys: &[String]) -> StorageResult<()> {
        let call = {
            let mut batches = self.delete_batches.lock().unwrap();
            batches.push(keys.len());
            batches.len()
        };
        if self.fail_delete_at == Some(call) {
            return Err(StorageError::Unavailable("injected delete failure".into()));
        }
        self.inner.delete_objects(keys).await
    }
}
