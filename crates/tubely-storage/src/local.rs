//! Local `assets/` directory store, served by the API under `/assets`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// URL of an asset served by the local API.
pub fn asset_url(port: u16, asset_path: &str) -> String {
    format!("http://localhost:{}/assets/{}", port, asset_path)
}

/// Object store that writes into a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    port: u16,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            root: root.into(),
            port,
        }
    }

    /// Create the assets root if it does not exist yet.
    pub async fn ensure_assets_dir(&self) -> StorageResult<()> {
        if !tokio::fs::try_exists(&self.root).await? {
            tokio::fs::create_dir_all(&self.root).await?;
            info!(root = %self.root.display(), "Created assets directory");
        }
        Ok(())
    }

    /// On-disk location of `asset_path`.
    pub fn assets_disk_path(&self, asset_path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(asset_path);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if asset_path.is_empty() || !is_plain {
            return Err(StorageError::InvalidKey(asset_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalAssetStore {
    async fn put_object(&self, key: &str, _content_type: &str, mut body: File) -> StorageResult<()> {
        let dest = self.assets_disk_path(key)?;
        debug!(key = %key, path = %dest.display(), "Writing asset");

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut out = File::create(&dest)
            .await
            .map_err(|e| StorageError::upload_failed(format!("create {}: {}", dest.display(), e)))?;
        tokio::io::copy(&mut body, &mut out)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        out.sync_all().await?;

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let path = self.assets_disk_path(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::delete_failed(format!("{}: {}", path.display(), e)))
    }

    fn public_url(&self, key: &str) -> String {
        asset_url(self.port, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_url() {
        assert_eq!(
            asset_url(8091, "landscape/abc.mp4"),
            "http://localhost:8091/assets/landscape/abc.mp4"
        );
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let store = LocalAssetStore::new("/srv/assets", 8091);
        assert!(store.assets_disk_path("../etc/passwd").is_err());
        assert!(store.assets_disk_path("/etc/passwd").is_err());
        assert!(store.assets_disk_path("").is_err());
        assert_eq!(
            store.assets_disk_path("other/a.mp4").unwrap(),
            PathBuf::from("/srv/assets/other/a.mp4")
        );
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path().join("assets"), 8091);
        store.ensure_assets_dir().await.unwrap();

        let src = dir.path().join("staged.mp4");
        tokio::fs::write(&src, b"video bytes").await.unwrap();
        let body = File::open(&src).await.unwrap();

        store
            .put_object("landscape/abc.mp4", "video/mp4", body)
            .await
            .unwrap();

        let written = dir.path().join("assets/landscape/abc.mp4");
        assert_eq!(tokio::fs::read(&written).await.unwrap(), b"video bytes");

        let url = store.public_url("landscape/abc.mp4");
        assert_eq!(store.key_for_url(&url).as_deref(), Some("landscape/abc.mp4"));

        store.delete_object("landscape/abc.mp4").await.unwrap();
        assert!(!written.exists());
    }
}
