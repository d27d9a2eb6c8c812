use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::is_valid_video_id;
use crate::http_server::{error::ApiError, state::AppState};
use crate::services::youtube::types::SongInfo;

/// GET /api/song-info/{video_id}
pub async fn song_info(
    State(app_state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<SongInfo>, ApiError> {
    if !is_valid_video_id(&video_id) {
        return Err(ApiError::BadRequest(format!(
            "Invalid video id: {}",
            video_id
        )));
    }

    app_state
        .youtube
        .get_song_info(&video_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Could not extract video information".to_string()))
}
