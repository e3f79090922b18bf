//! Defines routes for the file vault API.
//!
//! ## Structure
//! - **Probes**
//!   - `GET    /healthz`, `GET /readyz`
//!
//! - **Per-user storage** (owner taken from `x-owner-id`)
//!   - `POST   /api/v1/storage/upload`: multipart upload
//!   - `GET    /api/v1/storage/files`: list with preview URLs
//!   - `GET    /api/v1/storage/files/{id}/download`: download
//!   - `DELETE /api/v1/storage/files/{id}`: delete
//!   - `GET    /api/v1/storage/dashboard`: monthly usage
//!
//! - **Presigned blob access**
//!   - `GET    /blobs/{container}/{*key}`: local blob store URLs
//!
//! The wildcard `*key` allows nested keys like `{owner_id}/{object_id}`.

use std::{sync::Arc, time::Duration};

use crate::{
    handlers::{
        blob_handlers::serve_presigned,
        health_handlers::{healthz, readyz},
        object_handlers::{delete_file, download_file, list_files, upload_file},
        usage_handlers::dashboard,
    },
    routes::cors::cors_layer,
    services::storage_service::StorageService,
    stores::local_blob::LocalBlobStore,
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    routing::{delete, get, post},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Multipart framing allowance on top of the per-file ceiling.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageService,
    /// Present when blobs live on local disk and presigned URLs are served here.
    pub local_blobs: Option<Arc<LocalBlobStore>>,
}

impl FromRef<AppState> for StorageService {
    fn from_ref(state: &AppState) -> Self {
        state.storage.clone()
    }
}

/// Build and return the router for every API route.
///
/// `max_upload_bytes` bounds request bodies on the upload route; requests
/// running longer than `request_timeout` are answered with 408 and their
/// handler future is dropped, cancelling any in-flight store call.
/// `allowed_origins` feeds the CORS layer (empty allows any origin).
pub fn routes(
    max_upload_bytes: usize,
    request_timeout: Duration,
    allowed_origins: &[String],
) -> Router<AppState> {
    let storage = Router::new()
        .route(
            "/upload",
            post(upload_file)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/files", get(list_files))
        .route("/files/{id}", delete(delete_file))
        .route("/files/{id}/download", get(download_file))
        .route("/dashboard", get(dashboard));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1/storage", storage)
        .route("/blobs/{container}/{*key}", get(serve_presigned))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
