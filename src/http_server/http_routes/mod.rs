pub mod ping;
pub mod search_song;
pub mod song_info;
pub mod stream_url;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::http_server::error::ApiError;

/// Decode a JSON request body. A missing, empty or `null` body is reported as
/// "No data provided" so clients see the same message however they omit it.
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("No data provided".to_string()));
    }
    serde_json::from_slice::<Option<T>>(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?
        .ok_or_else(|| ApiError::BadRequest("No data provided".to_string()))
}

/// YouTube video ids are short strings of URL-safe base64 characters.
pub(crate) fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
