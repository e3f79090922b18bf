//! Issues short-lived read URLs for private objects.

use std::{sync::Arc, time::Duration};

use crate::stores::blob::{BlobResult, BlobStore, PresignOverrides};

/// Content type rendered inline in the browser instead of downloaded.
const INLINE_CONTENT_TYPE: &str = "application/pdf";

#[derive(Clone)]
pub struct AccessUrlIssuer {
    blobs: Arc<dyn BlobStore>,
    container: String,
}

impl AccessUrlIssuer {
    pub fn new(blobs: Arc<dyn BlobStore>, container: impl Into<String>) -> Self {
        Self {
            blobs,
            container: container.into(),
        }
    }

    /// Presign a GET for exactly one blob, valid for `ttl`.
    ///
    /// PDFs get response overrides so browsers display them inline.
    pub async fn issue_read_url(
        &self,
        storage_key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> BlobResult<String> {
        self.blobs
            .presign_get(
                &self.container,
                storage_key,
                ttl,
                overrides_for(content_type),
            )
            .await
    }
}

fn overrides_for(content_type: &str) -> Option<PresignOverrides> {
    (content_type == INLINE_CONTENT_TYPE).then(|| PresignOverrides {
        content_type: Some(INLINE_CONTENT_TYPE.to_string()),
        content_disposition: Some("inline".to_string()),
    })
}
