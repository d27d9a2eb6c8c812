use color_eyre::eyre::Result;

use crate::services::youtube::types::{AudioStream, Candidate, SongInfo};

/// Port trait wrapping the video search capability used by business logic.
///
/// Implementations live in `services::youtube::search` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for videos, returning at most `limit` results in the platform's ranking order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>>;
}

/// Port trait wrapping media extraction for a single video.
///
/// Implementations live in `services::youtube::ytdlp` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StreamResolver: Send + Sync {
    /// Highest bitrate audio-only stream, or `None` if the video has none.
    async fn resolve_best_audio(&self, video_url: &str) -> Result<Option<AudioStream>>;

    /// Metadata about the video, or `None` if nothing could be extracted.
    async fn song_info(&self, video_url: &str) -> Result<Option<SongInfo>>;
}

#[async_trait::async_trait]
impl<T: SearchProvider + ?Sized> SearchProvider for Box<T> {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        (**self).search(query, limit).await
    }
}

#[async_trait::async_trait]
impl<T: StreamResolver + ?Sized> StreamResolver for Box<T> {
    async fn resolve_best_audio(&self, video_url: &str) -> Result<Option<AudioStream>> {
        (**self).resolve_best_audio(video_url).await
    }

    async fn song_info(&self, video_url: &str) -> Result<Option<SongInfo>> {
        (**self).song_info(video_url).await
    }
}
