//! Video upload handler.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::Json;

use tubely_models::VideoRecord;

use crate::error::ApiResult;
use crate::state::AppState;

/// Upload the video file for an existing record.
///
/// POST /api/video_upload/:video_id (multipart, field `video`)
pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<VideoRecord>> {
    let video = state.uploads.upload(&video_id, &headers, multipart).await?;
    Ok(Json(video))
}
