//! SQLite-backed metadata store.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::metadata::{MetadataError, MetadataResult, MetadataStore, OwnerIndex};
use crate::models::object::StorageObject;

const INIT_SQL: &str = include_str!("../../migrations/0001_init.sql");

const SELECT_COLUMNS: &str = "SELECT object_id, owner_id, file_name, content_type, size_bytes,
        storage_key, storage_container, uploaded_at, updated_at, description
 FROM storage_objects";

#[derive(Clone)]
pub struct SqliteMetadataStore {
    db: Arc<SqlitePool>,
}

impl SqliteMetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Apply the embedded schema. Statements are idempotent.
    pub async fn migrate(&self) -> MetadataResult<()> {
        let statements = INIT_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        tracing::info!("Running {} migration statements...", statements.len());
        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn get_by_id(&self, object_id: Uuid) -> MetadataResult<Option<StorageObject>> {
        let sql = format!("{} WHERE object_id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, StorageObject>(&sql)
            .bind(object_id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(row)
    }

    async fn put(&self, object: &StorageObject) -> MetadataResult<()> {
        let result = sqlx::query(
            "INSERT INTO storage_objects (
                object_id, owner_id, file_name, content_type, size_bytes,
                storage_key, storage_container, uploaded_at, updated_at, description
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(object.object_id)
        .bind(&object.owner_id)
        .bind(&object.file_name)
        .bind(&object.content_type)
        .bind(object.size_bytes)
        .bind(&object.storage_key)
        .bind(&object.storage_container)
        .bind(object.uploaded_at)
        .bind(object.updated_at)
        .bind(&object.description)
        .execute(&*self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(MetadataError::Conflict(object.object_id)),
            Err(err) => Err(MetadataError::Sqlx(err)),
        }
    }

    async fn delete_by_id(&self, object_id: Uuid) -> MetadataResult<bool> {
        let result = sqlx::query("DELETE FROM storage_objects WHERE object_id = ?")
            .bind(object_id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query_by_owner(
        &self,
        index: OwnerIndex,
        owner_id: &str,
    ) -> MetadataResult<Vec<StorageObject>> {
        let sql = match index {
            OwnerIndex::Owner => format!("{} WHERE owner_id = ?", SELECT_COLUMNS),
            OwnerIndex::OwnerUploadedAt => format!(
                "{} WHERE owner_id = ? ORDER BY uploaded_at ASC",
                SELECT_COLUMNS
            ),
        };
        let rows = sqlx::query_as::<_, StorageObject>(&sql)
            .bind(owner_id)
            .fetch_all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn ping(&self) -> MetadataResult<()> {
        let v = sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        if v != 1 {
            return Err(MetadataError::Unavailable(format!("unexpected result: {}", v)));
        }
        Ok(())
    }
}
