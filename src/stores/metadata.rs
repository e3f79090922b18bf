//! Metadata store capability: a document table keyed by object id with
//! owner-partitioned secondary indexes.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::object::StorageObject;

pub type MetadataResult<T> = Result<T, MetadataError>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("object id `{0}` already exists")]
    Conflict(Uuid),
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Secondary index to query a user's records through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerIndex {
    /// Partitioned by owner only; result order is unspecified.
    Owner,
    /// Partitioned by owner, sorted by `uploaded_at` ascending.
    OwnerUploadedAt,
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get_by_id(&self, object_id: Uuid) -> MetadataResult<Option<StorageObject>>;

    /// Insert a new record. An existing `object_id` yields `MetadataError::Conflict`.
    async fn put(&self, object: &StorageObject) -> MetadataResult<()>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, object_id: Uuid) -> MetadataResult<bool>;

    async fn query_by_owner(
        &self,
        index: OwnerIndex,
        owner_id: &str,
    ) -> MetadataResult<Vec<StorageObject>>;

    async fn ping(&self) -> MetadataResult<()>;
}
