//! Video record handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use tubely_db::DbError;
use tubely_models::{CreateVideoRequest, VideoId, VideoRecord};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Create a draft video record owned by the caller.
///
/// POST /api/videos
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateVideoRequest>,
) -> ApiResult<(StatusCode, Json<VideoRecord>)> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let video = VideoRecord::new(user.user_id, title, request.description);
    state
        .videos
        .create_video(&video)
        .await
        .map_err(|e| ApiError::internal("Couldn't create video").with_cause(e))?;

    info!(video_id = %video.id, user_id = %user.user_id, "Created video");
    Ok((StatusCode::CREATED, Json(video)))
}

/// List the caller's videos, newest first.
///
/// GET /api/videos
pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<VideoRecord>>> {
    let videos = state
        .videos
        .list_videos_for_user(&user.user_id)
        .await
        .map_err(|e| ApiError::internal("Couldn't retrieve videos").with_cause(e))?;

    Ok(Json(videos))
}

/// Fetch one of the caller's videos.
///
/// GET /api/videos/:video_id
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = VideoId::parse(&video_id)
        .map_err(|e| ApiError::bad_request("Invalid video ID").with_cause(e))?;

    let video = match state.videos.get_video(&video_id).await {
        Ok(video) => video,
        Err(e @ DbError::NotFound(_)) => {
            return Err(ApiError::not_found("Couldn't find video").with_cause(e))
        }
        Err(e) => return Err(ApiError::internal("Couldn't get video").with_cause(e)),
    };

    if !video.is_owned_by(&user.user_id) {
        return Err(ApiError::unauthorized("You can't get this video"));
    }

    Ok(Json(video))
}
