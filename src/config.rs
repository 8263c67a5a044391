//! Configuration for aerofiles
//!
//! Loaded from a JSON file; every field has a default so `{}` is a valid
//! configuration. A few settings can be overridden from the environment:
//!
//! - `AEROFILES_SIGNING_SECRET`: secret for signed URLs
//! - `AEROFILES_PORT`: listen port

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_storage::{FileServiceSettings, MAX_KEYS};
use crate::http_server::HttpServerConfig;

pub const SECRET_ENV: &str = "AEROFILES_SIGNING_SECRET";
pub const PORT_ENV: &str = "AEROFILES_PORT";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub signing: SigningConfig,
    #[serde(default)]
    pub deletion: DeletionConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Which object store backs the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Files under `root/bucket`
    #[default]
    Local,
    /// Process memory, lost on exit
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Root directory for the local backend
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Bucket name; a directory under `root` for the local backend
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Keys per list call (1..=1000)
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

fn default_root() -> PathBuf {
    PathBuf::from("./aerofiles-data")
}

fn default_bucket() -> String {
    "files".to_string()
}

fn default_page_limit() -> usize {
    MAX_KEYS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            root: default_root(),
            bucket: default_bucket(),
            page_limit: default_page_limit(),
        }
    }
}

impl StorageConfig {
    /// Directory holding the local bucket
    pub fn bucket_root(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Secret for signed URLs; random per process when unset
    #[serde(default)]
    pub secret: Option<String>,

    /// Lifetime of issued URLs in seconds
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,

    /// Origin clients use to reach this server
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_url_ttl() -> u64 {
    3600
}

fn default_public_base_url() -> String {
    "http://localhost:54321".to_string()
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            secret: None,
            url_ttl_secs: default_url_ttl(),
            public_base_url: default_public_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionConfig {
    /// Cap on list calls per folder delete (unbounded when unset)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Include the partial `deletedCount` in failed folder delete responses
    #[serde(default = "default_true")]
    pub report_partial_count: bool,
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            report_partial_count: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Attach a signed view URL to each listed file
    #[serde(default = "default_true")]
    pub include_urls: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { include_urls: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directives; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// JSON lines instead of human-readable output
    #[serde(default = "default_true")]
    pub json: bool,
}

fn default_log_filter() -> String {
    "aerofiles=info,tower_http=info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                let mut config = Config::default();
                config.apply_env(|name| std::env::var(name).ok())?;
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse, apply environment overrides and validate
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_str(content)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(SECRET_ENV).filter(|s| !s.is_empty()) {
            self.signing.secret = Some(secret);
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} is not a port: {}", PORT_ENV, port)))?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".into()));
        }
        if self.signing.url_ttl_secs == 0 {
            return Err(ConfigError::Invalid("signing.url_ttl_secs must be > 0".into()));
        }
        if self.signing.public_base_url.is_empty() {
            return Err(ConfigError::Invalid("signing.public_base_url must be set".into()));
        }
        if !(1..=MAX_KEYS).contains(&self.storage.page_limit) {
            return Err(ConfigError::Invalid(format!(
                "storage.page_limit must be within 1..={}",
                MAX_KEYS
            )));
        }
        if self.storage.bucket.is_empty() || self.storage.bucket.contains(|c| c == '/' || c == '\\') {
            return Err(ConfigError::Invalid(format!(
                "storage.bucket is not a valid name: '{}'",
                self.storage.bucket
            )));
        }
        if self.deletion.max_pages == Some(0) {
            return Err(ConfigError::Invalid("deletion.max_pages must be > 0 when set".into()));
        }
        Ok(())
    }

    /// Settings handed to the file service
    pub fn file_service_settings(&self) -> FileServiceSettings {
        FileServiceSettings {
            include_urls_in_listing: self.listing.include_urls,
            max_delete_pages: self.deletion.max_pages,
        }
    }
}
