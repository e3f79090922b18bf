use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::storage_service::StorageError;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Client-correctable errors keep their message. Server-side failures were
/// already logged with object id, store and step by the coordinator, so the
/// response carries no store identifiers.
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Validation(msg) => AppError::bad_request(msg),
            StorageError::NotFound => AppError::not_found("file not found"),
            StorageError::Unauthorized => AppError::forbidden("unauthorized"),
            StorageError::BlobUnavailable { .. } => {
                AppError::internal("file storage is temporarily unavailable")
            }
            StorageError::MetadataUnavailable { .. } => {
                AppError::internal("file metadata is temporarily unavailable")
            }
            StorageError::PartialFailure { .. } => {
                AppError::internal("operation only partially completed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::blob::BlobError;
    use uuid::Uuid;

    #[test]
    fn storage_errors_map_to_statuses() {
        let cases = vec![
            (StorageError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (StorageError::NotFound, StatusCode::NOT_FOUND),
            (StorageError::Unauthorized, StatusCode::FORBIDDEN),
            (
                StorageError::BlobUnavailable {
                    object_id: Uuid::new_v4(),
                    operation: "get",
                    source: BlobError::Unavailable("down".into()),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn server_errors_hide_store_details() {
        let key = "u1/secret-object";
        let err = StorageError::PartialFailure {
            object_id: Uuid::new_v4(),
            step: "metadata put",
            orphan_key: key.into(),
            source: BlobError::Unavailable("down".into()).into(),
        };
        let app = AppError::from(err);
        assert!(!app.message.contains(key));
    }
}
