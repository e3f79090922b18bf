//! Blob store capability: put/get/delete/presign by `(container, key)`.

use std::{io, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

/// Streamed object payload.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob `{key}` not found")]
    NotFound { key: String },
    #[error("invalid blob key `{key}`")]
    InvalidKey { key: String },
    #[error("presigned URL generation failed: {0}")]
    Presign(String),
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Response header overrides baked into a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignOverrides {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `body` at `key`, replacing any previous blob. Returns bytes written.
    async fn put(
        &self,
        container: &str,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> BlobResult<u64>;

    /// Open the blob for reading.
    ///
    /// Returns `BlobError::NotFound` if nothing is stored at `key`.
    async fn get(&self, container: &str, key: &str) -> BlobResult<ByteStream>;

    /// Remove the blob. Removing a missing key succeeds.
    async fn delete(&self, container: &str, key: &str) -> BlobResult<()>;

    /// Build a URL granting read access to one blob for `ttl`.
    async fn presign_get(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
        overrides: Option<PresignOverrides>,
    ) -> BlobResult<String>;

    /// Cheap readiness probe.
    async fn ping(&self) -> BlobResult<()>;
}

/// Longest key any backend accepts, in bytes.
pub const MAX_KEY_LEN: usize = 1024;

/// Basic key validation to avoid trivial path traversal vectors.
///
/// Rejects empty keys, keys that begin with `/`, contain `..`, backslashes or
/// control characters.
pub fn ensure_key_safe(key: &str) -> BlobResult<()> {
    let invalid = key.is_empty()
        || key.len() > MAX_KEY_LEN
        || key.starts_with('/')
        || key.contains("..")
        || key.bytes().any(|b| b.is_ascii_control() || b == b'\\');
    if invalid {
        return Err(BlobError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
