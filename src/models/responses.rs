//! JSON envelopes returned by the HTTP handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{object::StorageObject, usage::UsageReport};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    pub object_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub message: String,
}

impl From<StorageObject> for UploadFileResponse {
    fn from(obj: StorageObject) -> Self {
        Self {
            object_id: obj.object_id,
            file_name: obj.file_name,
            file_size: obj.size_bytes,
            content_type: obj.content_type,
            uploaded_at: obj.uploaded_at,
            description: obj.description,
            message: "File uploaded successfully".into(),
        }
    }
}

/// A listed object, optionally enriched with a short-lived preview URL.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListedObject {
    #[serde(flatten)]
    pub object: StorageObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ListFilesResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<ListedObject>,
    pub count: usize,
}

impl ListFilesResponse {
    pub fn new(data: Vec<ListedObject>) -> Self {
        let message = if data.is_empty() {
            "No files found"
        } else {
            "Files fetched successfully"
        };
        Self {
            success: true,
            message: message.into(),
            count: data.len(),
            data,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct DashboardResponse {
    pub success: bool,
    pub message: String,
    pub data: UsageReport,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
