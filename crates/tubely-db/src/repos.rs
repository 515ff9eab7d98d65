//! Video repositories.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use tubely_models::{VideoId, VideoRecord};

use crate::error::{DbError, DbResult};

/// Storage for video records.
///
/// Writes are last-writer-wins; implementations do no optimistic
/// concurrency checking.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Load a record by ID.
    async fn get_video(&self, id: &VideoId) -> DbResult<VideoRecord>;

    /// Replace an existing record.
    async fn update_video(&self, video: &VideoRecord) -> DbResult<()>;

    /// Insert a new record.
    async fn create_video(&self, video: &VideoRecord) -> DbResult<()>;

    /// All records owned by `user_id`, newest first.
    async fn list_videos_for_user(&self, user_id: &Uuid) -> DbResult<Vec<VideoRecord>>;
}

/// Process-local repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<RwLock<HashMap<VideoId, VideoRecord>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `videos`.
    pub fn with_videos(videos: impl IntoIterator<Item = VideoRecord>) -> Self {
        let map = videos.into_iter().map(|v| (v.id, v)).collect();
        Self {
            videos: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn len(&self) -> usize {
        self.videos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.videos.read().await.is_empty()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: &VideoId) -> DbResult<VideoRecord> {
        self.videos
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(DbError::NotFound(*id))
    }

    async fn update_video(&self, video: &VideoRecord) -> DbResult<()> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                debug!(video_id = %video.id, "Updated video record");
                Ok(())
            }
            None => Err(DbError::NotFound(video.id)),
        }
    }

    async fn create_video(&self, video: &VideoRecord) -> DbResult<()> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video.id) {
            return Err(DbError::AlreadyExists(video.id));
        }
        videos.insert(video.id, video.clone());
        debug!(video_id = %video.id, user_id = %video.user_id, "Created video record");
        Ok(())
    }

    async fn list_videos_for_user(&self, user_id: &Uuid) -> DbResult<Vec<VideoRecord>> {
        let mut owned: Vec<VideoRecord> = self
            .videos
            .read()
            .await
            .values()
            .filter(|v| v.is_owned_by(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_update() {
        let repo = InMemoryVideoRepository::new();
        let mut video = VideoRecord::new(Uuid::new_v4(), "Boots", "");

        repo.create_video(&video).await.unwrap();
        assert_eq!(repo.get_video(&video.id).await.unwrap(), video);

        video.set_video_url("http://localhost:8091/assets/other/a.mp4");
        repo.update_video(&video).await.unwrap();
        assert_eq!(
            repo.get_video(&video.id).await.unwrap().video_url,
            video.video_url
        );
    }

    #[tokio::test]
    async fn test_missing_video() {
        let repo = InMemoryVideoRepository::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Ghost", "");

        assert!(matches!(
            repo.get_video(&video.id).await,
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(
            repo.update_video(&video).await,
            Err(DbError::NotFound(_))
        ));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let video = VideoRecord::new(Uuid::new_v4(), "Boots", "");
        let repo = InMemoryVideoRepository::with_videos([video.clone()]);
        assert!(matches!(
            repo.create_video(&video).await,
            Err(DbError::AlreadyExists(_))
        ));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let owner = Uuid::new_v4();
        let repo = InMemoryVideoRepository::with_videos([
            VideoRecord::new(owner, "one", ""),
            VideoRecord::new(owner, "two", ""),
            VideoRecord::new(Uuid::new_v4(), "theirs", ""),
        ]);

        let mine = repo.list_videos_for_user(&owner).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|v| v.user_id == owner));
    }
}
