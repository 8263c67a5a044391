//! Storage HTTP Routes
//!
//! Endpoints for file and folder management.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::file_storage::keys::{base_name, folder_prefix};
use crate::file_storage::{
    Disposition, FileService, FolderListing, SignedUrl, StorageError, UploadedFile,
};

use super::errors::ApiError;

// ==================
// Shared State
// ==================

/// Storage state shared across handlers
#[derive(Debug)]
pub struct StorageState {
    pub files: FileService,
    /// Report `deletedCount` when a folder delete fails part way
    pub report_partial_deletes: bool,
}

impl StorageState {
    pub fn new(files: FileService) -> Self {
        Self {
            files,
            report_partial_deletes: true,
        }
    }

    pub fn with_partial_delete_reporting(mut self, enabled: bool) -> Self {
        self.report_partial_deletes = enabled;
        self
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "isFolder")]
    pub is_folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "folderName")]
    pub folder_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignedObjectQuery {
    pub expires: i64,
    pub disposition: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderResponse {
    pub message: String,
    pub folder_key: String,
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub message: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolderResponse {
    pub message: String,
    pub deleted_count: u64,
    pub path: String,
}

// ==================
// Storage Routes
// ==================

/// Create storage routes
pub fn storage_routes(state: Arc<StorageState>) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/create-folder", post(create_folder_handler))
        .route("/list", get(list_handler))
        .route("/download", get(download_query_handler).post(download_body_handler))
        .route("/view", get(view_query_handler))
        .route("/view/*path", get(view_path_handler))
        .route("/delete", delete(delete_handler))
        // Target of signed URLs
        .route("/object/:token", get(signed_object_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn upload_handler(
    State(state): State<Arc<StorageState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    // A non-multipart body carries no file
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::Rejected(StorageError::NoFile));
    };

    let mut path = String::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "path" => path = field.text().await?,
            _ => {}
        }
    }

    let key = state
        .files
        .upload(&path, file)
        .await
        .map_err(|e| ApiError::storage("Upload failed", e))?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        key,
    }))
}

async fn create_folder_handler(
    State(state): State<Arc<StorageState>>,
    request: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<Json<CreateFolderResponse>, ApiError> {
    // A missing or unreadable body carries no folder name
    let Ok(Json(request)) = request else {
        return Err(ApiError::Rejected(StorageError::MissingField("Folder name required")));
    };

    let folder_key = state
        .files
        .create_folder(request.path.as_deref(), request.folder_name.as_deref())
        .await
        .map_err(|e| ApiError::storage("Folder creation failed", e))?;

    Ok(Json(CreateFolderResponse {
        message: "Folder created".to_string(),
        folder_key,
    }))
}

async fn list_handler(
    State(state): State<Arc<StorageState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<FolderListing>, ApiError> {
    let prefix = query.path.unwrap_or_default();

    let listing = state
        .files
        .list(&prefix)
        .await
        .map_err(|e| ApiError::storage("Listing failed", e))?;

    Ok(Json(listing))
}

fn sign(state: &StorageState, path: Option<&str>, disposition: Disposition) -> Result<Json<UrlResponse>, ApiError> {
    let url = state
        .files
        .sign(path, disposition)
        .map_err(|e| ApiError::storage("Download failed", e))?;
    Ok(Json(UrlResponse { url }))
}

async fn download_query_handler(
    State(state): State<Arc<StorageState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<UrlResponse>, ApiError> {
    sign(&state, query.path.as_deref(), Disposition::Attachment)
}

async fn download_body_handler(
    State(state): State<Arc<StorageState>>,
    request: Result<Json<PathQuery>, JsonRejection>,
) -> Result<Json<UrlResponse>, ApiError> {
    let path = request.ok().and_then(|Json(body)| body.path);
    sign(&state, path.as_deref(), Disposition::Attachment)
}

async fn view_query_handler(
    State(state): State<Arc<StorageState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<UrlResponse>, ApiError> {
    sign(&state, query.path.as_deref(), Disposition::Inline)
}

async fn view_path_handler(
    State(state): State<Arc<StorageState>>,
    Path(path): Path<String>,
) -> Result<Json<UrlResponse>, ApiError> {
    sign(&state, Some(&path), Disposition::Inline)
}

async fn delete_handler(
    State(state): State<Arc<StorageState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let path = query.path.unwrap_or_default();
    if path.is_empty() {
        return Err(ApiError::Rejected(StorageError::MissingField("Path required")));
    }

    if query.is_folder.as_deref() == Some("true") {
        let normalized = folder_prefix(&path).map_err(ApiError::Rejected)?;
        let (prefix, outcome) =
            state
                .files
                .delete_folder(&path)
                .await
                .map_err(|source| ApiError::FolderDelete {
                    path: normalized,
                    source,
                    report_count: state.report_partial_deletes,
                })?;

        return Ok(Json(DeleteFolderResponse {
            message: "Folder deleted successfully".to_string(),
            deleted_count: outcome.deleted_count,
            path: prefix,
        })
        .into_response());
    }

    state
        .files
        .delete_file(&path)
        .await
        .map_err(|e| ApiError::storage("Delete failed", e))?;

    Ok(Json(DeleteFileResponse {
        message: "File deleted successfully".to_string(),
        path,
    })
    .into_response())
}

async fn signed_object_handler(
    State(state): State<Arc<StorageState>>,
    Path(token): Path<String>,
    Query(query): Query<SignedObjectQuery>,
) -> Result<Response, ApiError> {
    let signed = SignedUrl::from_parts(&token, query.expires, &query.disposition, &query.signature)
        .map_err(ApiError::Rejected)?;

    let object = state
        .files
        .open_signed(&signed)
        .await
        .map_err(|e| ApiError::storage("Download failed", e))?;

    let disposition = match signed.disposition {
        Disposition::Inline => "inline".to_string(),
        Disposition::Attachment => format!(
            "attachment; filename=\"{}\"",
            sanitize_filename(base_name(&object.key))
        ),
    };

    let headers = [
        (header::CONTENT_TYPE, object.content_type),
        (header::CONTENT_DISPOSITION, disposition),
        (header::ETAG, format!("\"{}\"", object.checksum)),
    ];
    Ok((headers, object.body).into_response())
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}
