//! The object store seam.

use async_trait::async_trait;
use tokio::fs::File;

use crate::error::StorageResult;

/// Destination for uploaded videos.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stream `body` from its current position to `key`. Single attempt.
    async fn put_object(&self, key: &str, content_type: &str, body: File) -> StorageResult<()>;

    /// Remove an object.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// Publicly addressable URL for `key`.
    fn public_url(&self, key: &str) -> String;

    /// Recover the object key from a URL produced by [`ObjectStore::public_url`].
    fn key_for_url(&self, url: &str) -> Option<String> {
        let base = self.public_url("");
        url.strip_prefix(base.as_str())
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}
