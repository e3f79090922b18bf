//! In-memory stores with failure injection, used to exercise the coordinator
//! without touching disk or a database.

use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use uuid::Uuid;

use super::{
    blob::{BlobError, BlobResult, BlobStore, ByteStream, PresignOverrides},
    metadata::{MetadataError, MetadataResult, MetadataStore, OwnerIndex},
};
use crate::models::object::StorageObject;

/// Operations that can be forced to fail.
#[derive(Default)]
pub struct FailureSwitches {
    pub put: AtomicBool,
    pub get: AtomicBool,
    pub delete: AtomicBool,
    pub presign: AtomicBool,
    pub query: AtomicBool,
}

impl FailureSwitches {
    fn tripped(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }
}

/// Blob held in memory alongside its content type.
#[derive(Clone, Debug)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<(String, String), StoredBlob>>,
    pub fail: FailureSwitches,
    calls: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn blob(&self, container: &str, key: &str) -> Option<StoredBlob> {
        self.blobs
            .read()
            .ok()?
            .get(&(container.to_string(), key.to_string()))
            .cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Number of store calls made so far, probes included.
    #[cfg(test)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn poisoned() -> BlobError {
        BlobError::Unavailable("blob map lock poisoned".into())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        container: &str,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> BlobResult<u64> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.put) {
            return Err(BlobError::Unavailable("injected put failure".into()));
        }
        let chunks: Vec<Bytes> = body.try_collect().await?;
        let data = Bytes::from(chunks.concat());
        let len = data.len() as u64;
        self.blobs.write().map_err(|_| Self::poisoned())?.insert(
            (container.to_string(), key.to_string()),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(len)
    }

    async fn get(&self, container: &str, key: &str) -> BlobResult<ByteStream> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.get) {
            return Err(BlobError::Unavailable("injected get failure".into()));
        }
        let blob = self
            .blobs
            .read()
            .map_err(|_| Self::poisoned())?
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BlobError::NotFound {
                key: key.to_string(),
            })?;
        Ok(stream::once(async move { Ok::<_, std::io::Error>(blob.data) }).boxed())
    }

    async fn delete(&self, container: &str, key: &str) -> BlobResult<()> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.delete) {
            return Err(BlobError::Unavailable("injected delete failure".into()));
        }
        self.blobs
            .write()
            .map_err(|_| Self::poisoned())?
            .remove(&(container.to_string(), key.to_string()));
        Ok(())
    }

    async fn presign_get(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
        overrides: Option<PresignOverrides>,
    ) -> BlobResult<String> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.presign) {
            return Err(BlobError::Presign("injected presign failure".into()));
        }
        let mut url = format!("memory://{}/{}?ttl={}", container, key, ttl.as_secs());
        if let Some(o) = overrides {
            if let Some(ct) = o.content_type {
                url.push_str(&format!("&response-content-type={}", ct));
            }
            if let Some(cd) = o.content_disposition {
                url.push_str(&format!("&response-content-disposition={}", cd));
            }
        }
        Ok(url)
    }

    async fn ping(&self) -> BlobResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<Uuid, StorageObject>>,
    pub fail: FailureSwitches,
    calls: AtomicUsize,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn poisoned() -> MetadataError {
        MetadataError::Unavailable("record map lock poisoned".into())
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get_by_id(&self, object_id: Uuid) -> MetadataResult<Option<StorageObject>> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.get) {
            return Err(MetadataError::Unavailable("injected get failure".into()));
        }
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(&object_id).cloned())
    }

    async fn put(&self, object: &StorageObject) -> MetadataResult<()> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.put) {
            return Err(MetadataError::Unavailable("injected put failure".into()));
        }
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        if records.contains_key(&object.object_id) {
            return Err(MetadataError::Conflict(object.object_id));
        }
        records.insert(object.object_id, object.clone());
        Ok(())
    }

    async fn delete_by_id(&self, object_id: Uuid) -> MetadataResult<bool> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.delete) {
            return Err(MetadataError::Unavailable("injected delete failure".into()));
        }
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        Ok(records.remove(&object_id).is_some())
    }

    async fn query_by_owner(
        &self,
        index: OwnerIndex,
        owner_id: &str,
    ) -> MetadataResult<Vec<StorageObject>> {
        self.record_call();
        if FailureSwitches::tripped(&self.fail.query) {
            return Err(MetadataError::Unavailable("injected query failure".into()));
        }
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let mut owned: Vec<StorageObject> = records
            .values()
            .filter(|obj| obj.is_owned_by(owner_id))
            .cloned()
            .collect();
        if index == OwnerIndex::OwnerUploadedAt {
            owned.sort_by_key(|obj| obj.uploaded_at);
        }
        Ok(owned)
    }

    async fn ping(&self) -> MetadataResult<()> {
        Ok(())
    }
}
