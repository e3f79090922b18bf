//! Represents a stored file: the metadata half of an object whose bytes live
//! in the blob store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata record for one uploaded file.
///
/// The record never holds payload bytes. Its `storage_container` and
/// `storage_key` locate the blob, and `owner_id` drives every ownership check.
/// Records are written once at upload and never mutated afterwards.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    /// Primary key, generated at upload time.
    pub object_id: Uuid,

    /// Identity of the uploading user.
    pub owner_id: String,

    /// Original filename as supplied by the client.
    pub file_name: String,

    /// MIME type captured at upload.
    pub content_type: String,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Location of the blob inside the container (`{owner_id}/{object_id}`).
    pub storage_key: String,

    /// Blob store container (bucket) name.
    pub storage_container: String,

    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optional free-text description.
    pub description: Option<String>,
}

impl StorageObject {
    /// Derive the blob location for an object owned by `owner_id`.
    pub fn storage_key_for(owner_id: &str, object_id: Uuid) -> String {
        format!("{}/{}", owner_id, object_id)
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_joins_owner_and_object_id() {
        let id = Uuid::new_v4();
        assert_eq!(
            StorageObject::storage_key_for("user-1", id),
            format!("user-1/{}", id)
        );
    }
}
