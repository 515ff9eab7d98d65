//! Video upload pipeline.
//!
//! One request runs these steps in order and stops at the first failure:
//! identify the target video, authorize the caller, stage the upload on
//! disk, classify its aspect ratio, publish it to the object store, and
//! record the public URL on the video.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use tubely_db::VideoRepository;
use tubely_media::{processed_path, GeometryProber, Repackager};
use tubely_models::{VideoId, VideoRecord};
use tubely_storage::{object_key, KeyGenerator, ObjectStore};

use crate::auth::{bearer_token, validate_jwt};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::staging::{ScratchFile, StagedFile};

/// Multipart field carrying the video.
pub const VIDEO_FIELD: &str = "video";

/// The only media type accepted for upload.
pub const ACCEPTED_MEDIA_TYPE: &str = "video/mp4";

/// The caller is authenticated but does not own the target video.
#[derive(Debug, Error)]
#[error("user {user_id} is not the owner of video {video_id}")]
pub struct NotOwner {
    pub user_id: Uuid,
    pub video_id: VideoId,
}

/// Upload pipeline and its collaborators.
#[derive(Clone)]
pub struct UploadService {
    videos: Arc<dyn VideoRepository>,
    store: Arc<dyn ObjectStore>,
    prober: Arc<dyn GeometryProber>,
    repackager: Arc<dyn Repackager>,
    keys: KeyGenerator,
    jwt_secret: String,
    staging_dir: Option<PathBuf>,
    rollback_on_persist_failure: bool,
    repackage_for_streaming: bool,
}

impl UploadService {
    pub fn new(
        config: &ApiConfig,
        videos: Arc<dyn VideoRepository>,
        store: Arc<dyn ObjectStore>,
        prober: Arc<dyn GeometryProber>,
        repackager: Arc<dyn Repackager>,
        keys: KeyGenerator,
    ) -> Self {
        Self {
            videos,
            store,
            prober,
            repackager,
            keys,
            jwt_secret: config.jwt_secret.clone(),
            staging_dir: config.staging_dir.clone(),
            rollback_on_persist_failure: config.rollback_on_persist_failure,
            repackage_for_streaming: config.repackage_for_streaming,
        }
    }

    /// Run the pipeline for one request and return the updated record.
    #[instrument(skip_all, fields(video_id = %raw_video_id))]
    pub async fn upload(
        &self,
        raw_video_id: &str,
        headers: &HeaderMap,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> ApiResult<VideoRecord> {
        let start = Instant::now();
        let result = self.run(raw_video_id, headers, multipart).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(ApiError::BadRequest { .. }) => "bad_request",
            Err(ApiError::Unauthorized { .. }) => "unauthorized",
            Err(ApiError::NotFound { .. }) => "not_found",
            Err(ApiError::Internal { .. }) => "internal_error",
        };
        metrics::record_upload(outcome, start.elapsed().as_secs_f64());

        result
    }

    async fn run(
        &self,
        raw_video_id: &str,
        headers: &HeaderMap,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> ApiResult<VideoRecord> {
        let video_id = VideoId::parse(raw_video_id)
            .map_err(|e| ApiError::bad_request("Invalid ID").with_cause(e))?;

        let user_id = self.authenticate(headers)?;
        let mut video = self.authorize(&video_id, &user_id).await?;

        info!(user_id = %user_id, "Uploading video");

        let (mut staged, media_type) = self.ingest(multipart).await?;

        staged
            .rewind()
            .await
            .map_err(|e| ApiError::internal("Could not reset file pointer").with_cause(e))?;

        let probe_start = Instant::now();
        let aspect = self
            .prober
            .probe_aspect_ratio(staged.path())
            .await
            .map_err(|e| ApiError::internal("Error determining aspect ratio").with_cause(e))?;
        metrics::record_probe_duration(probe_start.elapsed().as_secs_f64());
        debug!(aspect = %aspect, "Classified upload");

        let key = object_key(aspect.prefix(), &self.keys.generate_key(&media_type));

        if self.repackage_for_streaming {
            // Claimed up front so a partial output is removed if ffmpeg fails
            let mut processed = ScratchFile::adopt(processed_path(staged.path()));
            let output = self
                .repackager
                .repackage_for_streaming(staged.path())
                .await
                .map_err(|e| ApiError::internal("Error processing video").with_cause(e))?;
            if output.as_path() != processed.path() {
                processed = ScratchFile::adopt(output);
            }
            let body = processed
                .open()
                .await
                .map_err(|e| ApiError::internal("Could not open processed file").with_cause(e))?;
            self.publish(&key, &media_type, body).await?;
        } else {
            staged
                .rewind()
                .await
                .map_err(|e| ApiError::internal("Could not reset file pointer").with_cause(e))?;
            let body = staged
                .body()
                .await
                .map_err(|e| ApiError::internal("Could not reset file pointer").with_cause(e))?;
            self.publish(&key, &media_type, body).await?;
        }

        video.set_video_url(self.store.public_url(&key));
        if let Err(e) = self.videos.update_video(&video).await {
            if self.rollback_on_persist_failure {
                self.rollback(&key).await;
            } else {
                warn!(key = %key, "Record update failed, uploaded object left in place");
            }
            return Err(ApiError::internal("Couldn't update video").with_cause(e));
        }

        info!(key = %key, url = ?video.video_url, "Upload complete");
        Ok(video)
    }

    fn authenticate(&self, headers: &HeaderMap) -> ApiResult<Uuid> {
        let token = bearer_token(headers)
            .map_err(|e| ApiError::unauthorized("Couldn't find JWT").with_cause(e))?;
        validate_jwt(token, &self.jwt_secret)
            .map_err(|e| ApiError::unauthorized("Couldn't validate JWT").with_cause(e))
    }

    async fn authorize(&self, video_id: &VideoId, user_id: &Uuid) -> ApiResult<VideoRecord> {
        let video = self
            .videos
            .get_video(video_id)
            .await
            .map_err(|e| ApiError::internal("Couldn't find video").with_cause(e))?;

        if !video.is_owned_by(user_id) {
            warn!(user_id = %user_id, owner = %video.user_id, "Upload attempted by non-owner");
            return Err(ApiError::unauthorized("Not authorized to upload video").with_cause(
                NotOwner {
                    user_id: *user_id,
                    video_id: *video_id,
                },
            ));
        }

        Ok(video)
    }

    /// Stream the `video` field to a staged file; returns it with its media type.
    async fn ingest(
        &self,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> ApiResult<(StagedFile, String)> {
        let mut multipart = multipart
            .map_err(|e| ApiError::bad_request("Unable to parse form file").with_cause(e))?;

        loop {
            let mut field = multipart
                .next_field()
                .await
                .map_err(|e| {
                    multipart_error(e, ApiError::bad_request("Unable to parse form file"))
                })?
                .ok_or_else(|| {
                    ApiError::bad_request("Unable to parse form file")
                        .with_cause(format!("missing '{}' field", VIDEO_FIELD))
                })?;

            if field.name() != Some(VIDEO_FIELD) {
                continue;
            }

            let declared = field.content_type().unwrap_or_default();
            let media_type = parse_media_type(declared)?;

            let mut staged = StagedFile::create(self.staging_dir.as_deref()).map_err(|e| {
                ApiError::internal("Unable to create temp file for upload").with_cause(e)
            })?;

            let mut size = 0usize;
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| multipart_error(e, ApiError::internal("Error saving file")))?
            {
                size += chunk.len();
                staged
                    .write_chunk(&chunk)
                    .await
                    .map_err(|e| ApiError::internal("Error saving file").with_cause(e))?;
            }

            debug!(bytes = size, path = %staged.path().display(), "Staged upload");
            return Ok((staged, media_type));
        }
    }

    async fn publish(&self, key: &str, media_type: &str, body: tokio::fs::File) -> ApiResult<()> {
        self.store
            .put_object(key, media_type, body)
            .await
            .map_err(|e| ApiError::internal("Error uploading file to S3").with_cause(e))
    }

    async fn rollback(&self, key: &str) {
        match self.store.delete_object(key).await {
            Ok(()) => info!(key = %key, "Deleted uploaded object after failed record update"),
            Err(e) => warn!(key = %key, error = %e, "Failed to delete uploaded object"),
        }
    }
}

/// Classify a multipart read failure.
///
/// Running past the body limit is a server-side save failure wherever it
/// surfaces; anything else takes the caller's classification.
fn multipart_error(e: MultipartError, otherwise: ApiError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::internal("Error saving file").with_cause(e)
    } else {
        otherwise.with_cause(e)
    }
}

/// Parse a declared content type and require `video/mp4`.
///
/// Parameters are ignored; only the `type/subtype` essence is compared.
pub fn parse_media_type(declared: &str) -> ApiResult<String> {
    let parsed: mime::Mime = declared
        .parse()
        .map_err(|e| ApiError::bad_request("Invalid Content-Type").with_cause(e))?;

    let essence = parsed.essence_str();
    if essence != ACCEPTED_MEDIA_TYPE {
        return Err(ApiError::bad_request("Content type is not allowed")
            .with_cause(format!("got '{}', expected '{}'", essence, ACCEPTED_MEDIA_TYPE)));
    }

    Ok(essence.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_type_accepts_mp4() {
        assert_eq!(parse_media_type("video/mp4").unwrap(), "video/mp4");
        assert_eq!(
            parse_media_type("video/mp4; codecs=\"avc1.42E01E\"").unwrap(),
            "video/mp4"
        );
    }

    #[test]
    fn test_parse_media_type_rejects_others() {
        assert!(matches!(
            parse_media_type("image/png"),
            Err(ApiError::BadRequest { .. })
        ));
        assert!(matches!(
            parse_media_type("video/quicktime"),
            Err(ApiError::BadRequest { .. })
        ));
        assert!(matches!(parse_media_type(""), Err(ApiError::BadRequest { .. })));
        assert!(matches!(
            parse_media_type("not a mime"),
            Err(ApiError::BadRequest { .. })
        ));
    }
}
