use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde::Deserialize;

use super::parse_json_body;
use crate::http_server::{error::ApiError, state::AppState};
use crate::services::youtube::matcher::DurationInput;
use crate::services::youtube::types::{SongMatch, SongQuery};

#[derive(Debug, Deserialize)]
pub struct SearchSongRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Seconds or a `M:SS` / `H:MM:SS` string. Kept loose so that an odd value
    /// only disables duration matching instead of failing the request.
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
}

impl SearchSongRequest {
    fn into_query(self) -> Result<SongQuery, ApiError> {
        let title = self.title.filter(|t| !t.trim().is_empty());
        let artist = self.artist.filter(|a| !a.trim().is_empty());
        let (Some(title), Some(artist)) = (title, artist) else {
            return Err(ApiError::BadRequest(
                "Both title and artist are required".to_string(),
            ));
        };

        let duration_secs = self.duration.as_ref().and_then(DurationInput::from_json);
        if self.duration.is_some() && duration_secs.is_none() {
            tracing::debug!("Ignoring unusable duration {:?}", self.duration);
        }

        Ok(SongQuery::new(title, artist, duration_secs))
    }
}

/// POST /api/search-song
pub async fn search_song(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SongMatch>, ApiError> {
    let query = parse_json_body::<SearchSongRequest>(&body)?.into_query()?;

    app_state
        .youtube
        .search_song(&query)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No videos found for the given song".to_string()))
}
