use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The song a caller is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongQuery {
    pub title: String,
    pub artist: String,
    /// Expected running time in seconds, already normalized.
    pub duration_secs: Option<u64>,
}

impl SongQuery {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_secs: Option<u64>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration_secs,
        }
    }
}

/// One video returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub channel_name: Option<String>,
    /// Running time as displayed by the platform, e.g. `3:45` or `1:02:03`.
    pub duration_text: Option<String>,
    pub description_snippet: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// The winning candidate of a song search, shaped for API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongMatch {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub duration: Option<String>,
}

/// Highest quality audio-only stream of a video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioStream {
    pub url: String,
    pub format_label: String,
    pub bitrate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamInfo {
    pub stream_url: String,
    /// Stream URLs are signed and stop working after a few hours.
    pub expires_at: DateTime<Utc>,
    pub format: String,
    pub bitrate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongInfo {
    pub title: String,
    pub duration: u64,
    pub thumbnail: String,
    pub uploader: String,
    pub view_count: u64,
    pub upload_date: String,
    pub description: String,
}

/// What to resolve a stream for: a bare video id or a full watch URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoTarget {
    Id(String),
    Url(String),
}

impl VideoTarget {
    pub fn watch_url(&self) -> String {
        match self {
            VideoTarget::Id(id) => watch_url(id),
            VideoTarget::Url(url) => url.clone(),
        }
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
