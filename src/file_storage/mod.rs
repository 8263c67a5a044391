//! # aerofiles File Storage Module
//!
//! File and folder operations over an object-storage bucket. Folders are
//! key prefixes plus optional zero-byte placeholder objects.

pub mod errors;
pub mod backend;
pub mod listing;
pub mod memory;
pub mod local;
pub mod keys;
pub mod signed_url;
pub mod prefix_delete;
pub mod service;

pub use errors::{StorageError, StorageResult};
pub use backend::{ListRequest, ListingPage, ObjectEntry, ObjectStore, StoredObject, MAX_DELETE_BATCH, MAX_KEYS};
pub use memory::MemoryBackend;
pub use local::LocalBackend;
pub use keys::FileCategory;
pub use signed_url::{Disposition, SignedUrl, SignedUrlGenerator};
pub use prefix_delete::{PrefixDeleteError, PrefixDeleteOutcome, PrefixDeleter};
pub use service::{FileService, FileServiceSettings, FolderListing, UploadedFile};
