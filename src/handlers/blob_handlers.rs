//! Serves presigned URLs issued by the local blob store.
//!
//! The URL itself is the credential: no owner header is required, but the
//! signature must cover the exact container, key, expiry and response
//! overrides being requested.

use crate::{
    errors::AppError,
    routes::routes::AppState,
    stores::{
        blob::{BlobError, BlobStore},
        local_blob::PresignedQuery,
    },
};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use tracing::debug;

/// `GET /blobs/{container}/{*key}`
pub async fn serve_presigned(
    State(state): State<AppState>,
    Path((container, key)): Path<(String, String)>,
    Query(query): Query<PresignedQuery>,
) -> Result<Response, AppError> {
    let local = state
        .local_blobs
        .as_ref()
        .ok_or_else(|| AppError::not_found("file not found"))?;

    if let Err(err) = local.verify_presigned(&container, &key, &query, Utc::now().timestamp()) {
        debug!(%container, %key, error = %err, "rejected presigned request");
        return Err(AppError::forbidden(err.to_string()));
    }

    let body = local.get(&container, &key).await.map_err(|err| match err {
        BlobError::NotFound { .. } | BlobError::InvalidKey { .. } => {
            AppError::not_found("file not found")
        }
        other => {
            tracing::error!(%container, %key, error = %other, "presigned blob read failed");
            AppError::internal("file storage is temporarily unavailable")
        }
    })?;

    let content_type = match query.response_content_type {
        Some(ct) => ct,
        None => local
            .content_type(&container, &key)
            .await
            .unwrap_or_else(|| "application/octet-stream".into()),
    };

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    if let Some(disposition) = query
        .response_content_disposition
        .as_deref()
        .and_then(|d| HeaderValue::from_str(d).ok())
    {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response)
}
