//! # Keys, Folders and File Types
//!
//! Folders are a naming convention: a folder is a key prefix ending in `/`,
//! optionally materialised as a zero-byte placeholder object with that key.
//! Nothing here gives folders an identity of their own.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{StorageError, StorageResult};

/// Folder separator in keys
pub const DELIMITER: char = '/';

/// MIME types accepted on upload
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "application/json",
    "image/png",
    "image/jpeg",
    "image/webp",
    "application/pdf",
];

pub fn is_allowed_mime(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

/// Broad file category derived from a file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Audio,
    Json,
    Image,
    Pdf,
    Other,
}

static CATEGORY_PATTERNS: LazyLock<Vec<(Regex, FileCategory)>> = LazyLock::new(|| {
    [
        (r"(?i)\.(mp3|wav)$", FileCategory::Audio),
        (r"(?i)\.json$", FileCategory::Json),
        (r"(?i)\.(png|jpg|jpeg|webp)$", FileCategory::Image),
        (r"(?i)\.pdf$", FileCategory::Pdf),
    ]
    .into_iter()
    .filter_map(|(pattern, category)| Regex::new(pattern).ok().map(|re| (re, category)))
    .collect()
});

impl FileCategory {
    pub fn from_name(name: &str) -> Self {
        CATEGORY_PATTERNS
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map(|(_, category)| *category)
            .unwrap_or(FileCategory::Other)
    }
}

/// Key of an uploaded file: the folder path and the file name, concatenated
/// as given
pub fn upload_key(path: &str, file_name: &str) -> String {
    format!("{}{}", path, file_name)
}

/// Key of the placeholder object for a new folder
pub fn folder_key(path: &str, folder_name: &str) -> String {
    format!("{}{}{}", path, folder_name, DELIMITER)
}

/// Deletion scope for a folder path; always ends with the delimiter so
/// `docs` never reaches `docs2/`
pub fn folder_prefix(path: &str) -> StorageResult<String> {
    if path.is_empty() {
        return Err(StorageError::EmptyPrefix);
    }
    if path.ends_with(DELIMITER) {
        Ok(path.to_string())
    } else {
        Ok(format!("{}{}", path, DELIMITER))
    }
}

/// Display name of a common prefix inside `current`: `docs/sub/` in `docs/`
/// is `sub`
pub fn folder_display_name(common_prefix: &str, current: &str) -> String {
    let rest = common_prefix.strip_prefix(current).unwrap_or(common_prefix);
    rest.strip_suffix(DELIMITER).unwrap_or(rest).to_string()
}

/// Display name of an object inside `current`
pub fn file_display_name(key: &str, current: &str) -> String {
    key.strip_prefix(current).unwrap_or(key).to_string()
}

/// Last path segment of a key, used for `Content-Disposition`
pub fn base_name(key: &str) -> &str {
    key.trim_end_matches(DELIMITER)
        .rsplit(DELIMITER)
        .next()
        .unwrap_or(key)
}
