//! # File Operations
//!
//! Upload, folder creation, listing, signed access and deletion over an
//! injected [`ObjectStore`]. Every operation maps to one or two store calls;
//! there are no retries.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::backend::{ListRequest, ObjectStore, StoredObject};
use super::errors::{StorageError, StorageResult};
use super::keys::{self, FileCategory};
use super::prefix_delete::{PrefixDeleteError, PrefixDeleteOutcome, PrefixDeleter};
use super::signed_url::{Disposition, SignedUrl, SignedUrlGenerator};
use crate::observability::Event;

/// Behavioural switches of the file service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileServiceSettings {
    /// Attach a signed inline URL to every listed file
    pub include_urls_in_listing: bool,
    /// Cap on list calls per folder delete; `None` is unbounded
    pub max_delete_pages: Option<usize>,
}

impl Default for FileServiceSettings {
    fn default() -> Self {
        Self {
            include_urls_in_listing: true,
            max_delete_pages: None,
        }
    }
}

/// A file received for upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// A folder (common prefix) inside a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
}

/// A file inside a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
    pub file_type: FileCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One level of the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderListing {
    pub current_path: String,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

/// File service for CRUD operations
#[derive(Debug, Clone)]
pub struct FileService {
    store: Arc<dyn ObjectStore>,
    signer: Arc<SignedUrlGenerator>,
    settings: FileServiceSettings,
}

impl FileService {
    /// Create a new file service
    pub fn new(
        store: Arc<dyn ObjectStore>,
        signer: SignedUrlGenerator,
        settings: FileServiceSettings,
    ) -> Self {
        Self {
            store,
            signer: Arc::new(signer),
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn signer(&self) -> &SignedUrlGenerator {
        &self.signer
    }

    pub fn settings(&self) -> &FileServiceSettings {
        &self.settings
    }

    /// Upload a file under `path`, returning its key
    pub async fn upload(&self, path: &str, file: Option<UploadedFile>) -> StorageResult<String> {
        let file = file
            .filter(|f| !f.file_name.is_empty())
            .ok_or(StorageError::NoFile)?;

        if !keys::is_allowed_mime(&file.content_type) {
            return Err(StorageError::UnsupportedMimeType(file.content_type));
        }

        let key = keys::upload_key(path, &file.file_name);
        self.store
            .put_object(&key, &file.data, &file.content_type)
            .await?;

        info!(
            event = %Event::ObjectUploaded,
            key = %key,
            size = file.data.len(),
            content_type = %file.content_type,
        );
        Ok(key)
    }

    /// Create a zero-byte folder placeholder, returning its key
    pub async fn create_folder(
        &self,
        path: Option<&str>,
        folder_name: Option<&str>,
    ) -> StorageResult<String> {
        let folder_name = folder_name
            .filter(|n| !n.is_empty())
            .ok_or(StorageError::MissingField("Folder name required"))?;

        let key = keys::folder_key(path.unwrap_or(""), folder_name);
        self.store.put_object(&key, &[], "application/x-directory").await?;

        info!(event = %Event::FolderCreated, key = %key);
        Ok(key)
    }

    /// List one level under `path`, walking every page
    pub async fn list(&self, path: &str) -> StorageResult<FolderListing> {
        let mut listing = FolderListing {
            current_path: path.to_string(),
            folders: Vec::new(),
            files: Vec::new(),
        };

        let mut token = None;
        loop {
            let page = self
                .store
                .list_objects(&ListRequest::folder(path).with_token(token))
                .await?;

            listing
                .folders
                .extend(page.common_prefixes.into_iter().map(|prefix| FolderEntry {
                    kind: EntryKind::Folder,
                    name: keys::folder_display_name(&prefix, path),
                    path: prefix,
                }));

            for object in page.objects {
                // The current folder's own placeholder
                if object.key == path {
                    continue;
                }
                let name = keys::file_display_name(&object.key, path);
                let url = self
                    .settings
                    .include_urls_in_listing
                    .then(|| self.signed_url(&object.key, Disposition::Inline));
                listing.files.push(FileEntry {
                    kind: EntryKind::File,
                    file_type: FileCategory::from_name(&name),
                    name,
                    path: object.key,
                    url,
                });
            }

            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(listing)
    }

    /// Issue a signed URL for `path` without checking that it exists
    pub fn sign(&self, path: Option<&str>, disposition: Disposition) -> StorageResult<String> {
        let key = path
            .filter(|p| !p.is_empty())
            .ok_or(StorageError::MissingField("Path required"))?;

        let url = self.signed_url(key, disposition);
        info!(event = %Event::SignedUrlIssued, key, disposition = %disposition);
        Ok(url)
    }

    fn signed_url(&self, key: &str, disposition: Disposition) -> String {
        let signed = self.signer.generate(key, disposition, None);
        self.signer.to_url(&signed)
    }

    /// Fetch the object a signed URL points at
    pub async fn open_signed(&self, url: &SignedUrl) -> StorageResult<StoredObject> {
        if let Err(e) = self.signer.verify(url) {
            warn!(event = %Event::SignedUrlRejected, key = %url.key, error = %e);
            return Err(e);
        }
        self.store.get_object(&url.key).await
    }

    /// Delete a single object
    pub async fn delete_file(&self, path: &str) -> StorageResult<()> {
        if path.is_empty() {
            return Err(StorageError::MissingField("Path required"));
        }
        self.store.delete_object(path).await?;

        info!(event = %Event::ObjectDeleted, key = path);
        Ok(())
    }

    /// Delete a folder and everything under it, returning the prefix used.
    ///
    /// The deletion runs in its own task: once started it finishes even if
    /// the caller stops waiting.
    pub async fn delete_folder(
        &self,
        path: &str,
    ) -> Result<(String, PrefixDeleteOutcome), PrefixDeleteError> {
        let prefix = keys::folder_prefix(path).map_err(|source| PrefixDeleteError {
            deleted_count: 0,
            source,
        })?;

        let deleter =
            PrefixDeleter::new(self.store.clone()).with_max_pages(self.settings.max_delete_pages);
        let task_prefix = prefix.clone();
        let handle = tokio::spawn(async move { deleter.delete_by_prefix(&task_prefix).await });

        match handle.await {
            Ok(result) => result.map(|outcome| (prefix, outcome)),
            // Batches may already be gone; the count died with the task
            Err(join) => {
                error!(
                    event = %Event::PrefixDeleteFailed,
                    prefix = %prefix,
                    deleted_count = "unknown",
                    error = %join,
                    "delete task aborted"
                );
                Err(PrefixDeleteError {
                    deleted_count: 0,
                    source: StorageError::Internal(format!(
                        "delete task aborted, deleted count unknown: {}",
                        join
                    )),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::memory::MemoryBackend;

    fn service_with(store: Arc<MemoryBackend>, settings: FileServiceSettings) -> FileService {
        let signer = SignedUrlGenerator::new(b"unit-secret", "http://localhost:54321");
        FileService::new(store, signer, settings)
    }

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: b"\x89PNG".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_builds_key_from_path() {
        let store = Arc::new(MemoryBackend::new());
        let service = service_with(store.clone(), FileServiceSettings::default());

        let key = service.upload("pics/", Some(png("a.png"))).await.unwrap();
        assert_eq!(key, "pics/a.png");
        assert!(store.contains("pics/a.png"));
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_type() {
        let store = Arc::new(MemoryBackend::new());
        let service = service_with(store.clone(), FileServiceSettings::default());

        let mut file = png("notes.txt");
        file.content_type = "text/plain".to_string();

        let err = service.upload("", Some(file)).await.unwrap_err();
        assert_eq!(err, StorageError::UnsupportedMimeType("text/plain".into()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upload_requires_file() {
        let service = service_with(Arc::new(MemoryBackend::new()), FileServiceSettings::default());
        assert_eq!(service.upload("", None).await, Err(StorageError::NoFile));
        assert_eq!(service.upload("", Some(png(""))).await, Err(StorageError::NoFile));
    }

    #[tokio::test]
    async fn test_create_folder() {
        let store = Arc::new(MemoryBackend::new());
        let service = service_with(store.clone(), FileServiceSettings::default());

        let key = service.create_folder(Some("docs/"), Some("sub")).await.unwrap();
        assert_eq!(key, "docs/sub/");
        assert!(store.get_object("docs/sub/").await.unwrap().body.is_empty());

        let err = service.create_folder(Some("docs/"), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Folder name required");
    }

    #[tokio::test]
    async fn test_list_groups_folders_and_files() {
        let store = Arc::new(MemoryBackend::with_page_limit(1));
        for key in ["docs/", "docs/a.pdf", "docs/sub/", "docs/sub/b.mp3", "top.json"] {
            store.put_object(key, b"", "application/pdf").await.unwrap();
        }
        let service = service_with(
            store,
            FileServiceSettings {
                include_urls_in_listing: false,
                ..Default::default()
            },
        );

        let listing = service.list("docs/").await.unwrap();
        assert_eq!(listing.current_path, "docs/");
        assert_eq!(
            listing.folders,
            vec![FolderEntry {
                kind: EntryKind::Folder,
                name: "sub".into(),
                path: "docs/sub/".into(),
            }]
        );
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "a.pdf");
        assert_eq!(listing.files[0].file_type, FileCategory::Pdf);
        assert!(listing.files[0].url.is_none());
    }

    #[tokio::test]
    async fn test_list_attaches_signed_urls() {
        let store = Arc::new(MemoryBackend::new());
        store.put_object("a.png", b"", "image/png").await.unwrap();
        let service = service_with(store, FileServiceSettings::default());

        let listing = service.list("").await.unwrap();
        let url = listing.files[0].url.as_deref().unwrap();
        assert!(url.starts_with("http://localhost:54321/object/"));
        assert!(url.contains("disposition=inline"));
    }

    #[tokio::test]
    async fn test_listing_serializes_client_shape() {
        let listing = FolderListing {
            current_path: "docs/".into(),
            folders: vec![],
            files: vec![FileEntry {
                kind: EntryKind::File,
                name: "a.pdf".into(),
                path: "docs/a.pdf".into(),
                file_type: FileCategory::Pdf,
                url: None,
            }],
        };

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["currentPath"], "docs/");
        assert_eq!(json["files"][0]["type"], "file");
        assert_eq!(json["files"][0]["fileType"], "pdf");
        assert!(json["files"][0].get("url").is_none());
    }

    #[tokio::test]
    async fn test_sign_requires_path() {
        let service = service_with(Arc::new(MemoryBackend::new()), FileServiceSettings::default());
        assert!(service.sign(None, Disposition::Attachment).is_err());
        assert!(service.sign(Some(""), Disposition::Inline).is_err());
        assert!(service.sign(Some("a.png"), Disposition::Inline).is_ok());
    }

    #[tokio::test]
    async fn test_delete_folder_appends_delimiter() {
        let store = Arc::new(MemoryBackend::new());
        for key in ["docs/", "docs/a.pdf", "docs2/b.pdf"] {
            store.put_object(key, b"", "application/pdf").await.unwrap();
        }
        let service = service_with(store.clone(), FileServiceSettings::default());

        let (prefix, outcome) = service.delete_folder("docs").await.unwrap();
        assert_eq!(prefix, "docs/");
        assert_eq!(outcome.deleted_count, 2);
        assert!(store.contains("docs2/b.pdf"));
    }

    #[tokio::test]
    async fn test_delete_file() {
        let store = Arc::new(MemoryBackend::new());
        store.put_object("a.json", b"{}", "application/json").await.unwrap();
        let service = service_with(store.clone(), FileServiceSettings::default());

        service.delete_file("a.json").await.unwrap();
        assert!(store.is_empty());
        assert!(service.delete_file("").await.is_err());
    }
    /// Store whose batch delete panics after the first page is listed
    #[derive(Debug)]
    struct PanickingStore(MemoryBackend);

    #[async_trait::async_trait]
    impl ObjectStore for PanickingStore {
        async fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> StorageResult<()> {
            self.0.put_object(key, body, content_type).await
        }

        async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
            self.0.get_object(key).await
        }

        async fn list_objects(
            &self,
            request: &ListRequest,
        ) -> StorageResult<crate::file_storage::backend::ListingPage> {
            self.0.list_objects(request).await
        }

        async fn delete_object(&self, key: &str) -> StorageResult<()> {
            self.0.delete_object(key).await
        }

        async fn delete_objects(&self, _keys: &[String]) -> StorageResult<()> {
            panic!("batch delete blew up");
        }
    }

    #[tokio::test]
    async fn test_aborted_delete_task_says_count_unknown() {
        let inner = MemoryBackend::new();
        inner.put_object("docs/a", b"x", "text/plain").await.unwrap();
        let files = FileService::new(
            Arc::new(PanickingStore(inner)),
            SignedUrlGenerator::new(b"unit-secret", "http://localhost:54321"),
            FileServiceSettings::default(),
        );

        let err = files.delete_folder("docs").await.unwrap_err();

        assert_eq!(err.deleted_count, 0);
        match err.source {
            StorageError::Internal(message) => assert!(message.contains("deleted count unknown")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
