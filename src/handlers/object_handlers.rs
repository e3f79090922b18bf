//! HTTP handlers for per-user file operations.
//! Multipart parsing and response shaping live here; consistency between the
//! blob and metadata stores is `StorageService`'s job.

use crate::{
    errors::AppError,
    handlers::owner::Owner,
    models::{
        object::StorageObject,
        responses::{ListFilesResponse, MessageResponse, UploadFileResponse},
    },
    services::storage_service::{StorageService, UploadRequest},
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{StreamExt, stream};
use uuid::Uuid;

/// `POST /api/v1/storage/upload`: multipart `file` plus optional `description`.
pub async fn upload_file(
    State(service): State<StorageService>,
    Owner(owner_id): Owner,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.body_text()))?;
                file = Some((file_name, content_type, data));
            }
            Some("description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(err.body_text()))?;
                description = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::bad_request("File is required"))?;

    let req = UploadRequest {
        owner_id,
        file_name,
        size_bytes: data.len() as i64,
        content_type,
        description,
    };
    let body = stream::once(async move { Ok::<_, std::io::Error>(data) }).boxed();
    let object = service.upload_object(req, body).await?;

    Ok((StatusCode::CREATED, Json(UploadFileResponse::from(object))))
}

/// `GET /api/v1/storage/files`: the caller's files with preview URLs.
pub async fn list_files(
    State(service): State<StorageService>,
    Owner(owner_id): Owner,
) -> Result<Json<ListFilesResponse>, AppError> {
    let listed = service.list_objects_with_urls(&owner_id).await?;
    Ok(Json(ListFilesResponse::new(listed)))
}

/// `GET /api/v1/storage/files/{id}/download`: streams the payload as an attachment.
pub async fn download_file(
    State(service): State<StorageService>,
    Owner(owner_id): Owner,
    Path(object_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let download = service.resolve_for_download(object_id, &owner_id).await?;

    let mut response = Response::new(Body::from_stream(download.body));
    *response.status_mut() = StatusCode::OK;
    set_download_headers(response.headers_mut(), &download.object);
    Ok(response)
}

/// `DELETE /api/v1/storage/files/{id}`
pub async fn delete_file(
    State(service): State<StorageService>,
    Owner(owner_id): Owner,
    Path(object_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = service.delete_object(&owner_id, object_id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

fn set_download_headers(headers: &mut HeaderMap, meta: &StorageObject) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&meta.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&attachment_disposition(&meta.file_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    if let Ok(value) = HeaderValue::from_str(&meta.updated_at.to_rfc2822()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
}

/// `attachment; filename="..."` with quotes, backslashes and control chars dropped.
fn attachment_disposition(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    format!("attachment; filename=\"{}\"", cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_strips_header_breaking_chars() {
        assert_eq!(
            attachment_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            attachment_disposition("a\"b\\c\r\n.pdf"),
            "attachment; filename=\"abc.pdf\""
        );
    }
}
