use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde::Deserialize;
use url::Url;

use super::{is_valid_video_id, parse_json_body};
use crate::http_server::{error::ApiError, state::AppState};
use crate::services::youtube::types::{StreamInfo, VideoTarget};

#[derive(Debug, Deserialize)]
pub struct StreamUrlRequest {
    pub video_id: Option<String>,
    pub youtube_url: Option<String>,
}

impl StreamUrlRequest {
    /// A full URL takes precedence over a bare id.
    fn into_target(self) -> Result<VideoTarget, ApiError> {
        let youtube_url = self.youtube_url.filter(|u| !u.trim().is_empty());
        let video_id = self.video_id.filter(|id| !id.trim().is_empty());

        match (youtube_url, video_id) {
            (Some(url), _) => {
                let parsed = Url::parse(url.trim()).map_err(|e| {
                    ApiError::BadRequest(format!("Invalid youtube_url '{}': {}", url, e))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ApiError::BadRequest(format!(
                        "youtube_url must be an http(s) URL, got '{}'",
                        url
                    )));
                }
                Ok(VideoTarget::Url(parsed.to_string()))
            }
            (None, Some(id)) if is_valid_video_id(&id) => Ok(VideoTarget::Id(id)),
            (None, Some(id)) => Err(ApiError::BadRequest(format!("Invalid video_id '{}'", id))),
            (None, None) => Err(ApiError::BadRequest(
                "Either video_id or youtube_url must be provided".to_string(),
            )),
        }
    }
}

/// POST /api/get-stream-url
pub async fn get_stream_url(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<StreamInfo>, ApiError> {
    let target = parse_json_body::<StreamUrlRequest>(&body)?.into_target()?;

    app_state
        .youtube
        .get_stream_url(&target)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No audio format found".to_string()))
}
