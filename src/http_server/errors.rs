//! HTTP error responses
//!
//! Client mistakes come back as 4xx with the validation message. Backend
//! failures come back as 500 with a fixed per-operation message; their
//! detail goes to the log only.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::file_storage::{PrefixDeleteError, StorageError};
use crate::observability::Event;

/// `{ "message": ... }` body shared by most responses
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a folder delete that stopped part way
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDeleteResponse {
    pub message: String,
    pub deleted_count: u64,
    pub path: String,
}

/// Errors returned by storage handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before reaching the backend, or a 4xx from it
    #[error("{0}")]
    Rejected(StorageError),

    /// Backend failure
    #[error("{operation}: {source}")]
    Failed {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    /// Malformed multipart body
    #[error("{0}")]
    Multipart(#[from] MultipartError),

    /// Folder delete that stopped early
    #[error("folder delete of {path} failed: {source}")]
    FolderDelete {
        path: String,
        #[source]
        source: PrefixDeleteError,
        report_count: bool,
    },
}

impl ApiError {
    /// Classify a storage error raised while performing `operation`
    pub fn storage(operation: &'static str, err: StorageError) -> Self {
        if err.status_code() < 500 {
            ApiError::Rejected(err)
        } else {
            ApiError::Failed {
                operation,
                source: err,
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            ApiError::Rejected(e) => e.status_code(),
            ApiError::Failed { .. } => 500,
            ApiError::Multipart(e) => e.status().as_u16(),
            ApiError::FolderDelete { source, .. } if source.source.status_code() < 500 => {
                source.source.status_code()
            }
            ApiError::FolderDelete { .. } => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ApiError::Rejected(e) => (status, Json(MessageResponse::new(e.to_string()))).into_response(),
            ApiError::Multipart(e) => (status, Json(MessageResponse::new(e.body_text()))).into_response(),
            ApiError::Failed { operation, source } => {
                error!(event = %Event::RequestFailed, operation, error = %source);
                (status, Json(MessageResponse::new(operation))).into_response()
            }
            ApiError::FolderDelete { source, .. } if status.is_client_error() => {
                (status, Json(MessageResponse::new(source.source.to_string()))).into_response()
            }
            ApiError::FolderDelete {
                path,
                source,
                report_count,
            } => {
                error!(
                    event = %Event::RequestFailed,
                    operation = "Delete failed",
                    path = %path,
                    deleted_count = source.deleted_count,
                    error = %source.source,
                );
                if report_count {
                    let body = PartialDeleteResponse {
                        message: "Delete failed".to_string(),
                        deleted_count: source.deleted_count,
                        path,
                    };
                    (status, Json(body)).into_response()
                } else {
                    (status, Json(MessageResponse::new("Delete failed"))).into_response()
                }
            }
        }
    }
}
