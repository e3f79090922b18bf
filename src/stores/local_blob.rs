//! Disk-backed blob store.
//!
//! Payloads are sharded beneath `root/{container}/{shard}/{shard}/{key}` and
//! written through a temp file that is fsynced and renamed into place. Read
//! access for browsers goes through HMAC-signed URLs served by the
//! `/blobs/{container}/{*key}` route.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::blob::{
    BlobError, BlobResult, BlobStore, ByteStream, PresignOverrides, ensure_key_safe,
};

type HmacSha256 = Hmac<Sha256>;

/// Upper bound on presigned URL lifetime.
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// Query string carried by a presigned URL.
#[derive(Debug, Clone, Deserialize)]
pub struct PresignedQuery {
    pub expires: i64,
    pub signature: String,
    #[serde(rename = "response-content-type")]
    pub response_content_type: Option<String>,
    #[serde(rename = "response-content-disposition")]
    pub response_content_disposition: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("presigned URL expired")]
    Expired,
    #[error("presigned URL signature mismatch")]
    Mismatch,
}

#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: Url,
    signing_key: Vec<u8>,
}

impl LocalBlobStore {
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: Url,
        signing_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            root: root.into(),
            public_base_url,
            signing_key: signing_key.into(),
        }
    }

    fn container_root(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }

    /// Two-level shard identifiers: the first two bytes of MD5(container/key)
    /// as lowercase hex. Keeps file counts per directory small.
    fn shards(container: &str, key: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", container, key));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    fn blob_path(&self, container: &str, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::shards(container, key);
        let mut path = self.container_root(container);
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    fn content_type_path(blob_path: &Path) -> PathBuf {
        let mut name = blob_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(CONTENT_TYPE_SUFFIX);
        blob_path.with_file_name(name)
    }

    fn ensure_location_safe(container: &str, key: &str) -> BlobResult<()> {
        if container.contains('/') {
            return Err(BlobError::InvalidKey {
                key: container.to_string(),
            });
        }
        ensure_key_safe(container)?;
        ensure_key_safe(key)
    }

    /// Content type recorded when the blob was written, if any.
    pub async fn content_type(&self, container: &str, key: &str) -> Option<String> {
        Self::ensure_location_safe(container, key).ok()?;
        let path = Self::content_type_path(&self.blob_path(container, key));
        fs::read_to_string(path).await.ok()
    }

    fn canonical_request(
        container: &str,
        key: &str,
        expires: i64,
        content_type: Option<&str>,
        content_disposition: Option<&str>,
    ) -> String {
        format!(
            "GET\n{}\n{}\n{}\n{}\n{}",
            container,
            key,
            expires,
            content_type.unwrap_or(""),
            content_disposition.unwrap_or("")
        )
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.signing_key)
            .unwrap_or_else(|_| unreachable!("HMAC can take key of any size"))
    }

    fn sign(&self, canonical: &str) -> String {
        let mut mac = self.mac();
        mac.update(canonical.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check a presigned request against the signing key and `now` (unix seconds).
    pub fn verify_presigned(
        &self,
        container: &str,
        key: &str,
        query: &PresignedQuery,
        now: i64,
    ) -> Result<(), SignatureError> {
        if now > query.expires {
            return Err(SignatureError::Expired);
        }
        let provided = hex::decode(&query.signature).map_err(|_| SignatureError::Mismatch)?;
        let canonical = Self::canonical_request(
            container,
            key,
            query.expires,
            query.response_content_type.as_deref(),
            query.response_content_disposition.as_deref(),
        );
        let mut mac = self.mac();
        mac.update(canonical.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Recursively remove empty directories up to the container root.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        container: &str,
        key: &str,
        mut body: ByteStream,
        content_type: &str,
    ) -> BlobResult<u64> {
        Self::ensure_location_safe(container, key)?;

        let file_path = self.blob_path(container, key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            BlobError::Io(io::Error::new(
                ErrorKind::Other,
                "blob path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut written: u64 = 0;
        while let Some(chunk_res) = body.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(BlobError::Io(err));
                }
            };
            written += chunk.len() as u64;
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }
        fs::write(Self::content_type_path(&file_path), content_type).await?;

        debug!(container, key, bytes = written, "wrote blob {}", file_path.display());
        Ok(written)
    }

    async fn get(&self, container: &str, key: &str) -> BlobResult<ByteStream> {
        Self::ensure_location_safe(container, key)?;
        let file_path = self.blob_path(container, key);
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                BlobError::NotFound {
                    key: key.to_string(),
                }
            } else {
                BlobError::Io(err)
            }
        })?;
        Ok(ReaderStream::new(file).boxed())
    }

    async fn delete(&self, container: &str, key: &str) -> BlobResult<()> {
        Self::ensure_location_safe(container, key)?;
        let file_path = self.blob_path(container, key);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed blob {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("blob {} already missing", file_path.display());
            }
            Err(err) => return Err(BlobError::Io(err)),
        }
        match fs::remove_file(Self::content_type_path(&file_path)).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(BlobError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            let container_root = self.container_root(container);
            self.prune_empty_dirs(parent, &container_root).await;
        }
        Ok(())
    }

    async fn presign_get(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
        overrides: Option<PresignOverrides>,
    ) -> BlobResult<String> {
        Self::ensure_location_safe(container, key)?;
        if ttl.is_zero() || ttl > MAX_PRESIGN_TTL {
            return Err(BlobError::Presign(format!(
                "ttl {:?} outside (0, {:?}]",
                ttl, MAX_PRESIGN_TTL
            )));
        }

        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let (content_type, content_disposition) = match overrides {
            Some(o) => (o.content_type, o.content_disposition),
            None => (None, None),
        };
        let signature = self.sign(&Self::canonical_request(
            container,
            key,
            expires,
            content_type.as_deref(),
            content_disposition.as_deref(),
        ));

        let mut url = self.public_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BlobError::Presign("public base URL cannot carry a path".into()))?
            .pop_if_empty()
            .push("blobs")
            .push(container)
            .extend(key.split('/'));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("expires", &expires.to_string());
            if let Some(ct) = &content_type {
                query.append_pair("response-content-type", ct);
            }
            if let Some(cd) = &content_disposition {
                query.append_pair("response-content-disposition", cd);
            }
            query.append_pair("signature", &signature);
        }
        Ok(url.to_string())
    }

    /// Best-effort write/read/delete of a probe file under the root.
    async fn ping(&self) -> BlobResult<()> {
        fs::create_dir_all(&self.root).await?;
        let probe = self.root.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&probe, b"readyz").await?;
        let bytes = fs::read(&probe).await;
        let _ = fs::remove_file(&probe).await;
        if bytes? != b"readyz" {
            return Err(BlobError::Unavailable("probe file content mismatch".into()));
        }
        Ok(())
    }
}
