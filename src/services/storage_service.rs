//! src/services/storage_service.rs
//!
//! StorageService keeps the blob store and the metadata store in agreement.
//! Neither store offers a transaction spanning both, so every write is an
//! ordered two-step sequence with a known failure window:
//!
//! - upload writes the blob, then the metadata record. A metadata failure
//!   leaves an orphaned blob and surfaces as `PartialFailure`.
//! - delete removes the metadata record, then the blob. A blob failure leaves
//!   an unreferenced blob and surfaces as `PartialFailure`.
//!
//! Nothing is compensated or retried here; orphans are reconciled out of band.

use std::{io, sync::Arc};

use chrono::Utc;
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::CoordinatorConfig,
    models::{object::StorageObject, responses::ListedObject, usage::UsageReport},
    services::{access_urls::AccessUrlIssuer, usage},
    stores::{
        blob::{BlobError, BlobStore, ByteStream, MAX_KEY_LEN},
        metadata::{MetadataError, MetadataStore, OwnerIndex},
    },
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("blob store {operation} failed for object {object_id}: {source}")]
    BlobUnavailable {
        object_id: Uuid,
        operation: &'static str,
        #[source]
        source: BlobError,
    },
    #[error("metadata store {operation} failed: {source}")]
    MetadataUnavailable {
        object_id: Option<Uuid>,
        operation: &'static str,
        #[source]
        source: MetadataError,
    },
    #[error("partial failure at {step} for object {object_id}; orphaned blob `{orphan_key}`")]
    PartialFailure {
        object_id: Uuid,
        step: &'static str,
        orphan_key: String,
        #[source]
        source: StoreFailure,
    },
}

/// The store error behind a partial failure.
#[derive(Debug, Error)]
pub enum StoreFailure {
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Owner ids must leave room for `/{uuid}` inside a blob key.
const MAX_OWNER_ID_LEN: usize = MAX_KEY_LEN - 1 - 36;

/// Descriptive fields of an upload; the payload travels separately.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner_id: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub description: Option<String>,
}

/// An authorized download: the record plus its payload stream.
pub struct Download {
    pub object: StorageObject,
    pub body: ByteStream,
}

/// Coordinates uploads, listings, downloads and deletes across both stores.
///
/// Holds no per-request state; clones share the same store handles.
#[derive(Clone)]
pub struct StorageService {
    config: Arc<CoordinatorConfig>,
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    issuer: AccessUrlIssuer,
}

impl StorageService {
    pub fn new(
        config: CoordinatorConfig,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let issuer = AccessUrlIssuer::new(blobs.clone(), config.container.clone());
        Self {
            config: Arc::new(config),
            blobs,
            metadata,
            issuer,
        }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    fn ensure_owner_id(owner_id: &str) -> StorageResult<()> {
        if owner_id.trim().is_empty() {
            return Err(StorageError::Validation("owner id cannot be empty".into()));
        }
        if owner_id.len() > MAX_OWNER_ID_LEN {
            return Err(StorageError::Validation(format!(
                "owner id exceeds {} bytes",
                MAX_OWNER_ID_LEN
            )));
        }
        if owner_id.contains("..")
            || owner_id
                .bytes()
                .any(|b| b == b'/' || b == b'\\' || b.is_ascii_control())
        {
            return Err(StorageError::Validation("owner id contains invalid characters".into()));
        }
        Ok(())
    }

    /// Reject requests that must never reach a store.
    fn validate_upload(&self, req: &UploadRequest) -> StorageResult<()> {
        Self::ensure_owner_id(&req.owner_id)?;
        if req.file_name.trim().is_empty() {
            return Err(StorageError::Validation("file name is required".into()));
        }
        if req.size_bytes < 0 {
            return Err(StorageError::Validation("file size cannot be negative".into()));
        }
        if req.size_bytes > self.config.max_object_bytes {
            return Err(StorageError::Validation(format!(
                "file size exceeds {} MB limit",
                self.config.max_object_bytes / (1024 * 1024)
            )));
        }
        if !self
            .config
            .allowed_content_types
            .iter()
            .any(|allowed| allowed == &req.content_type)
        {
            return Err(StorageError::Validation(
                "file type not allowed. Allowed: JPEG, PNG, GIF, WebP, PDF".into(),
            ));
        }
        Ok(())
    }

    /// Store a new object: blob first, then its metadata record.
    ///
    /// The body is capped at the configured ceiling; a longer stream aborts
    /// the blob write.
    pub async fn upload_object(
        &self,
        req: UploadRequest,
        body: ByteStream,
    ) -> StorageResult<StorageObject> {
        self.validate_upload(&req)?;

        let object_id = Uuid::new_v4();
        let storage_key = StorageObject::storage_key_for(&req.owner_id, object_id);
        let container = self.config.container.clone();

        let limit = self.config.max_object_bytes as u64;
        let mut seen: u64 = 0;
        let capped = body
            .map(move |chunk| {
                let chunk = chunk?;
                seen += chunk.len() as u64;
                if seen > limit {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "upload exceeds size limit",
                    ));
                }
                Ok(chunk)
            })
            .boxed();

        let written = self
            .blobs
            .put(&container, &storage_key, capped, &req.content_type)
            .await
            .map_err(|source| {
                error!(%object_id, store = "blob", step = "blob put", error = %source, "upload failed before metadata write");
                StorageError::BlobUnavailable {
                    object_id,
                    operation: "put",
                    source,
                }
            })?;
        if written != req.size_bytes as u64 {
            debug!(%object_id, declared = req.size_bytes, written, "declared size differs from bytes written; recording written");
        }

        let now = Utc::now();
        let object = StorageObject {
            object_id,
            owner_id: req.owner_id,
            file_name: req.file_name,
            content_type: req.content_type,
            size_bytes: written as i64,
            storage_key,
            storage_container: container,
            uploaded_at: now,
            updated_at: now,
            description: req.description,
        };

        if let Err(source) = self.metadata.put(&object).await {
            error!(
                %object_id,
                store = "metadata",
                step = "metadata put",
                orphan_container = %object.storage_container,
                orphan_key = %object.storage_key,
                error = %source,
                "blob written but metadata write failed; blob is orphaned"
            );
            return Err(StorageError::PartialFailure {
                object_id,
                step: "metadata put",
                orphan_key: object.storage_key,
                source: source.into(),
            });
        }

        info!(%object_id, owner_id = %object.owner_id, size = object.size_bytes, "object uploaded");
        Ok(object)
    }

    /// All records owned by `owner_id`, in no particular order.
    pub async fn list_objects(&self, owner_id: &str) -> StorageResult<Vec<StorageObject>> {
        Self::ensure_owner_id(owner_id)?;
        self.metadata
            .query_by_owner(OwnerIndex::Owner, owner_id)
            .await
            .map_err(|source| {
                error!(owner_id, store = "metadata", step = "query by owner", error = %source, "listing failed");
                StorageError::MetadataUnavailable {
                    object_id: None,
                    operation: "query by owner",
                    source,
                }
            })
    }

    /// List and attach a preview URL to each record.
    ///
    /// A URL that cannot be issued is left empty; the rest of the listing
    /// still succeeds.
    pub async fn list_objects_with_urls(&self, owner_id: &str) -> StorageResult<Vec<ListedObject>> {
        let objects = self.list_objects(owner_id).await?;
        let mut listed = Vec::with_capacity(objects.len());
        for object in objects {
            let preview_url = match self
                .issuer
                .issue_read_url(&object.storage_key, &object.content_type, self.config.preview_ttl)
                .await
            {
                Ok(url) => Some(url),
                Err(err) => {
                    warn!(object_id = %object.object_id, error = %err, "failed to generate preview URL");
                    None
                }
            };
            listed.push(ListedObject {
                object,
                preview_url,
            });
        }
        Ok(listed)
    }

    /// Fetch a record and check it belongs to `owner_id` before any blob access.
    async fn fetch_owned(
        &self,
        object_id: Uuid,
        owner_id: &str,
        operation: &'static str,
    ) -> StorageResult<StorageObject> {
        Self::ensure_owner_id(owner_id)?;
        let record = self
            .metadata
            .get_by_id(object_id)
            .await
            .map_err(|source| {
                error!(%object_id, store = "metadata", step = operation, error = %source, "metadata lookup failed");
                StorageError::MetadataUnavailable {
                    object_id: Some(object_id),
                    operation,
                    source,
                }
            })?
            .ok_or(StorageError::NotFound)?;

        if !record.is_owned_by(owner_id) {
            debug!(%object_id, operation, "ownership check rejected request");
            return Err(StorageError::Unauthorized);
        }
        Ok(record)
    }

    pub async fn resolve_for_download(
        &self,
        object_id: Uuid,
        requesting_owner_id: &str,
    ) -> StorageResult<Download> {
        let object = self
            .fetch_owned(object_id, requesting_owner_id, "get by id")
            .await?;

        let body = self
            .blobs
            .get(&object.storage_container, &object.storage_key)
            .await
            .map_err(|source| {
                error!(
                    %object_id,
                    store = "blob",
                    step = "blob get",
                    key = %object.storage_key,
                    error = %source,
                    "metadata present but blob unreadable"
                );
                StorageError::BlobUnavailable {
                    object_id,
                    operation: "get",
                    source,
                }
            })?;

        Ok(Download { object, body })
    }

    /// Remove metadata, then the blob. Returns a confirmation message.
    pub async fn delete_object(&self, owner_id: &str, object_id: Uuid) -> StorageResult<String> {
        let object = self.fetch_owned(object_id, owner_id, "get by id").await?;

        match self.metadata.delete_by_id(object_id).await {
            Ok(true) => {}
            // Raced with another delete; the blob is that request's to remove.
            Ok(false) => return Err(StorageError::NotFound),
            Err(source) => {
                error!(%object_id, store = "metadata", step = "metadata delete", error = %source, "delete aborted; blob untouched");
                return Err(StorageError::MetadataUnavailable {
                    object_id: Some(object_id),
                    operation: "delete by id",
                    source,
                });
            }
        }

        if let Err(source) = self
            .blobs
            .delete(&object.storage_container, &object.storage_key)
            .await
        {
            error!(
                %object_id,
                store = "blob",
                step = "blob delete",
                orphan_container = %object.storage_container,
                orphan_key = %object.storage_key,
                error = %source,
                "metadata removed but blob delete failed; blob is orphaned"
            );
            return Err(StorageError::PartialFailure {
                object_id,
                step: "blob delete",
                orphan_key: object.storage_key,
                source: source.into(),
            });
        }

        info!(%object_id, owner_id, "object deleted");
        Ok("File deleted successfully".to_string())
    }

    pub async fn compute_monthly_usage(&self, owner_id: &str) -> StorageResult<UsageReport> {
        Self::ensure_owner_id(owner_id)?;
        let records = self
            .metadata
            .query_by_owner(OwnerIndex::OwnerUploadedAt, owner_id)
            .await
            .map_err(|source| {
                error!(owner_id, store = "metadata", step = "query by owner+uploaded_at", error = %source, "usage query failed");
                StorageError::MetadataUnavailable {
                    object_id: None,
                    operation: "query by owner+uploaded_at",
                    source,
                }
            })?;
        Ok(usage::monthly_usage(&records, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::{InMemoryBlobStore, InMemoryMetadataStore};
    use bytes::Bytes;
    use futures::{TryStreamExt, stream};
    use std::{sync::atomic::Ordering, time::Duration};

    struct Harness {
        service: StorageService,
        blobs: Arc<InMemoryBlobStore>,
        metadata: Arc<InMemoryMetadataStore>,
    }

    fn harness() -> Harness {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let service = StorageService::new(
            CoordinatorConfig::new("vault"),
            blobs.clone(),
            metadata.clone(),
        );
        Harness {
            service,
            blobs,
            metadata,
        }
    }

    fn body(data: &[u8]) -> ByteStream {
        stream::iter(vec![Ok(Bytes::copy_from_slice(data))]).boxed()
    }

    fn request(owner: &str, name: &str, content_type: &str, size: i64) -> UploadRequest {
        UploadRequest {
            owner_id: owner.into(),
            file_name: name.into(),
            size_bytes: size,
            content_type: content_type.into(),
            description: None,
        }
    }

    async fn upload(h: &Harness, owner: &str, data: &[u8]) -> StorageObject {
        h.service
            .upload_object(
                request(owner, "photo.png", "image/png", data.len() as i64),
                body(data),
            )
            .await
            .unwrap()
    }

    async fn read_all(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn upload_then_download_returns_same_bytes() {
        let h = harness();
        let obj = upload(&h, "u1", b"png bytes").await;

        assert_eq!(obj.storage_key, format!("u1/{}", obj.object_id));
        assert_eq!(obj.storage_container, "vault");
        assert_eq!(obj.uploaded_at, obj.updated_at);

        let download = h.service.resolve_for_download(obj.object_id, "u1").await.unwrap();
        assert_eq!(download.object, obj);
        assert_eq!(read_all(download.body).await, b"png bytes");
        assert_eq!(h.blobs.blob("vault", &obj.storage_key).unwrap().content_type, "image/png");
    }

    #[tokio::test]
    async fn disallowed_type_is_rejected_before_any_store_call() {
        let h = harness();
        let result = h
            .service
            .upload_object(request("u1", "notes.txt", "text/plain", 5), body(b"hello"))
            .await;
        assert!(matches!(result, Err(StorageError::Validation(_))));
        assert_eq!(h.blobs.calls(), 0);
        assert_eq!(h.metadata.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_and_empty_inputs_fail_validation() {
        let h = harness();
        let too_big = 50 * 1024 * 1024 + 1;
        let cases = vec![
            request("u1", "big.png", "image/png", too_big),
            request("", "a.png", "image/png", 1),
            request("u1", " ", "image/png", 1),
            request("u1", "a.png", "image/png", -1),
        ];
        for req in cases {
            let result = h.service.upload_object(req, body(b"x")).await;
            assert!(matches!(result, Err(StorageError::Validation(_))));
        }
        assert_eq!(h.blobs.calls() + h.metadata.calls(), 0);
    }

    #[tokio::test]
    async fn owner_ids_unusable_in_blob_keys_fail_validation() {
        let h = harness();
        let long_owner = "x".repeat(1000);
        for owner in ["u\\1", "u\n1", "a/b", "u..1", long_owner.as_str()] {
            let result = h
                .service
                .upload_object(request(owner, "a.png", "image/png", 1), body(b"x"))
                .await;
            assert!(
                matches!(result, Err(StorageError::Validation(_))),
                "owner {:?} should be rejected",
                owner
            );
        }
        assert_eq!(h.blobs.calls(), 0);
        assert_eq!(h.metadata.calls(), 0);

        let longest = "x".repeat(MAX_OWNER_ID_LEN);
        let obj = upload(&h, &longest, b"x").await;
        assert_eq!(obj.storage_key.len(), MAX_KEY_LEN);
    }

    #[tokio::test]
    async fn recorded_size_is_bytes_written_not_declared() {
        let h = harness();
        let obj = h
            .service
            .upload_object(request("u1", "a.png", "image/png", 1), body(b"12345"))
            .await
            .unwrap();
        assert_eq!(obj.size_bytes, 5);

        let report = h.service.compute_monthly_usage("u1").await.unwrap();
        assert_eq!(report.summary.total_size_in_bytes, 5);
    }

    #[tokio::test]
    async fn stream_longer_than_ceiling_aborts_blob_write() {
        let h = harness();
        let mut config = CoordinatorConfig::new("vault");
        config.max_object_bytes = 4;
        let service = StorageService::new(config, h.blobs.clone(), h.metadata.clone());

        let result = service
            .upload_object(request("u1", "a.png", "image/png", 4), body(b"too long"))
            .await;
        assert!(matches!(result, Err(StorageError::BlobUnavailable { .. })));
        assert_eq!(h.blobs.len(), 0);
        assert_eq!(h.metadata.len(), 0);
    }

    #[tokio::test]
    async fn blob_failure_writes_no_metadata() {
        let h = harness();
        h.blobs.fail.put.store(true, Ordering::SeqCst);
        let result = h
            .service
            .upload_object(request("u1", "a.png", "image/png", 3), body(b"abc"))
            .await;
        assert!(matches!(
            result,
            Err(StorageError::BlobUnavailable { operation: "put", .. })
        ));
        assert_eq!(h.metadata.len(), 0);
        assert_eq!(h.metadata.calls(), 0);
    }

    #[tokio::test]
    async fn metadata_failure_after_blob_write_is_partial_failure() {
        let h = harness();
        h.metadata.fail.put.store(true, Ordering::SeqCst);
        let result = h
            .service
            .upload_object(request("u1", "a.png", "image/png", 3), body(b"abc"))
            .await;
        match result {
            Err(StorageError::PartialFailure {
                object_id,
                step,
                orphan_key,
                ..
            }) => {
                assert_eq!(step, "metadata put");
                assert_eq!(orphan_key, format!("u1/{}", object_id));
                // No compensating delete: the orphan stays for reconciliation.
                assert!(h.blobs.blob("vault", &orphan_key).is_some());
            }
            other => panic!("expected partial failure, got {:?}", other.map(|o| o.object_id)),
        }
        assert_eq!(h.metadata.len(), 0);
    }

    #[tokio::test]
    async fn list_returns_only_owner_records_and_empty_is_ok() {
        let h = harness();
        upload(&h, "u1", b"a").await;
        upload(&h, "u1", b"b").await;
        upload(&h, "u2", b"c").await;

        let mine = h.service.list_objects("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|o| o.owner_id == "u1"));

        let nobody = h.service.list_objects("u3").await.unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn list_failure_is_metadata_unavailable() {
        let h = harness();
        h.metadata.fail.query.store(true, Ordering::SeqCst);
        let result = h.service.list_objects("u1").await;
        assert!(matches!(result, Err(StorageError::MetadataUnavailable { .. })));
    }

    #[tokio::test]
    async fn listing_survives_url_issue_failures() {
        let h = harness();
        let pdf = h
            .service
            .upload_object(
                request("u1", "report.pdf", "application/pdf", 3),
                body(b"pdf"),
            )
            .await
            .unwrap();

        let listed = h.service.list_objects_with_urls("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        let url = listed[0].preview_url.as_deref().unwrap();
        assert!(url.contains(&pdf.storage_key));
        assert!(url.contains("ttl=1800"));
        assert!(url.contains("response-content-disposition=inline"));

        h.blobs.fail.presign.store(true, Ordering::SeqCst);
        let degraded = h.service.list_objects_with_urls("u1").await.unwrap();
        assert_eq!(degraded.len(), 1);
        assert!(degraded[0].preview_url.is_none());
    }

    #[tokio::test]
    async fn non_owner_gets_unauthorized_without_blob_access() {
        let h = harness();
        let obj = upload(&h, "u1", b"secret").await;
        let calls_before = h.blobs.calls();

        let download = h.service.resolve_for_download(obj.object_id, "u2").await;
        assert!(matches!(download, Err(StorageError::Unauthorized)));
        let delete = h.service.delete_object("u2", obj.object_id).await;
        assert!(matches!(delete, Err(StorageError::Unauthorized)));

        assert_eq!(h.blobs.calls(), calls_before);
        assert_eq!(h.metadata.len(), 1);
        assert_eq!(StorageError::Unauthorized.to_string(), "unauthorized");
    }

    #[tokio::test]
    async fn unknown_object_is_not_found() {
        let h = harness();
        let result = h.service.resolve_for_download(Uuid::new_v4(), "u1").await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn missing_blob_after_metadata_is_blob_unavailable() {
        let h = harness();
        let obj = upload(&h, "u1", b"bytes").await;
        h.blobs.delete("vault", &obj.storage_key).await.unwrap();

        let result = h.service.resolve_for_download(obj.object_id, "u1").await;
        assert!(matches!(
            result,
            Err(StorageError::BlobUnavailable { operation: "get", .. })
        ));
    }

    #[tokio::test]
    async fn delete_of_unknown_object_is_not_found() {
        let h = harness();
        let result = h.service.delete_object("u1", Uuid::new_v4()).await;
        assert!(matches!(result, Err(StorageError::NotFound)));
        assert_eq!(h.blobs.calls(), 0);
    }

    #[tokio::test]
    async fn usage_query_failure_is_metadata_unavailable() {
        let h = harness();
        upload(&h, "u1", b"bytes").await;
        h.metadata.fail.query.store(true, Ordering::SeqCst);

        let result = h.service.compute_monthly_usage("u1").await;
        assert!(matches!(
            result,
            Err(StorageError::MetadataUnavailable {
                object_id: None,
                operation: "query by owner+uploaded_at",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn delete_then_download_is_not_found() {
        let h = harness();
        let obj = upload(&h, "u1", b"bytes").await;

        let message = h.service.delete_object("u1", obj.object_id).await.unwrap();
        assert_eq!(message, "File deleted successfully");
        assert_eq!(h.blobs.len(), 0);

        let result = h.service.resolve_for_download(obj.object_id, "u1").await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn metadata_delete_failure_keeps_blob() {
        let h = harness();
        let obj = upload(&h, "u1", b"bytes").await;
        h.metadata.fail.delete.store(true, Ordering::SeqCst);

        let result = h.service.delete_object("u1", obj.object_id).await;
        assert!(matches!(result, Err(StorageError::MetadataUnavailable { .. })));
        assert!(h.blobs.blob("vault", &obj.storage_key).is_some());
        assert_eq!(h.metadata.len(), 1);
    }

    #[tokio::test]
    async fn blob_delete_failure_is_partial_failure() {
        let h = harness();
        let obj = upload(&h, "u1", b"bytes").await;
        h.blobs.fail.delete.store(true, Ordering::SeqCst);

        let result = h.service.delete_object("u1", obj.object_id).await;
        assert!(matches!(
            result,
            Err(StorageError::PartialFailure { step: "blob delete", .. })
        ));
        assert_eq!(h.metadata.len(), 0);
        assert!(h.blobs.blob("vault", &obj.storage_key).is_some());
    }

    #[tokio::test]
    async fn monthly_usage_counts_current_upload() {
        let h = harness();
        let ten_mib = 10 * 1024 * 1024;
        let data = vec![7u8; ten_mib];
        h.service
            .upload_object(
                request("u1", "report.pdf", "application/pdf", ten_mib as i64),
                body(&data),
            )
            .await
            .unwrap();

        let listed = h.service.list_objects("u1").await.unwrap();
        assert_eq!(listed[0].size_bytes, ten_mib as i64);
        assert_eq!(listed[0].content_type, "application/pdf");

        let report = h.service.compute_monthly_usage("u1").await.unwrap();
        assert_eq!(report.months.len(), 12);
        assert_eq!(report.months[11].file_count, 1);
        assert_eq!(report.months[11].total_size, ten_mib as i64);
        assert!(report.months[..11].iter().all(|m| m.file_count == 0));

        let empty = h.service.compute_monthly_usage("u2").await.unwrap();
        assert_eq!(empty.months.len(), 12);
        assert_eq!(empty.summary.total_files, 0);
    }

    #[tokio::test]
    async fn dropped_upload_future_writes_nothing() {
        let h = harness();
        let pending = stream::pending::<io::Result<Bytes>>().boxed();
        let upload = h
            .service
            .upload_object(request("u1", "a.png", "image/png", 1), pending);
        let timed_out = tokio::time::timeout(Duration::from_millis(20), upload).await;
        assert!(timed_out.is_err());
        assert_eq!(h.blobs.len(), 0);
        assert_eq!(h.metadata.len(), 0);
    }
}
