use chrono::{Duration, Utc};
use color_eyre::eyre::Result;
use tracing::instrument;

use super::matcher::{self, ScoringWeights};
use super::types::{SongInfo, SongMatch, SongQuery, StreamInfo, VideoTarget, watch_url};
use crate::ports::youtube::{SearchProvider, StreamResolver};

/// Tunables for [`YoutubeService`].
#[derive(Debug, Clone)]
pub struct YoutubeServiceOptions {
    pub search_limit: usize,
    pub weights: ScoringWeights,
    pub stream_url_ttl: Duration,
}

impl Default for YoutubeServiceOptions {
    fn default() -> Self {
        Self {
            search_limit: 5,
            weights: ScoringWeights::default(),
            stream_url_ttl: Duration::hours(6),
        }
    }
}

pub struct YoutubeService<S: SearchProvider, R: StreamResolver> {
    search: S,
    resolver: R,
    options: YoutubeServiceOptions,
}

impl<S: SearchProvider, R: StreamResolver> YoutubeService<S, R> {
    pub fn new(search: S, resolver: R, options: YoutubeServiceOptions) -> Self {
        Self {
            search,
            resolver,
            options,
        }
    }

    /// Find the video that best matches a song.
    ///
    /// Searches for the official audio first and falls back to a plain
    /// "title artist" search when that yields nothing. Returns `None` if
    /// neither search has any results.
    #[instrument(skip(self), fields(title = %query.title, artist = %query.artist))]
    pub async fn search_song(&self, query: &SongQuery) -> Result<Option<SongMatch>> {
        let limit = self.options.search_limit;

        let mut results = self
            .search
            .search(&format!("{} {} official audio", query.title, query.artist), limit)
            .await?;

        if results.is_empty() {
            tracing::debug!("No results for official audio search, broadening query");
            results = self
                .search
                .search(&format!("{} {}", query.title, query.artist), limit)
                .await?;
        }

        let Some(best) = matcher::select_best_match(query, &results, &self.options.weights) else {
            tracing::info!(
                "No videos found for '{}' by '{}'",
                query.title,
                query.artist
            );
            return Ok(None);
        };
        tracing::debug!("Best match for '{}': id={}, title='{}'", query.title, best.id, best.title);

        Ok(Some(SongMatch {
            video_id: best.id.clone(),
            title: best.title.clone(),
            url: watch_url(&best.id),
            thumbnail: best.thumbnail_url.clone().unwrap_or_default(),
            duration: best.duration_text.clone(),
        }))
    }

    /// Resolve a direct audio stream URL for a video.
    #[instrument(skip(self))]
    pub async fn get_stream_url(&self, target: &VideoTarget) -> Result<Option<StreamInfo>> {
        let url = target.watch_url();
        let Some(stream) = self.resolver.resolve_best_audio(&url).await? else {
            return Ok(None);
        };

        Ok(Some(StreamInfo {
            stream_url: stream.url,
            expires_at: Utc::now() + self.options.stream_url_ttl,
            format: stream.format_label,
            bitrate: stream.bitrate,
        }))
    }

    #[instrument(skip(self))]
    pub async fn get_song_info(&self, video_id: &str) -> Result<Option<SongInfo>> {
        self.resolver.song_info(&watch_url(video_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::youtube::{MockSearchProvider, MockStreamResolver};
    use crate::services::youtube::types::{AudioStream, Candidate};
    use color_eyre::eyre::eyre;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn candidate(id: &str, title: &str, channel: Option<&str>) -> Candidate {
        Candidate {
            id: id.to_string(),
            title: title.to_string(),
            channel_name: channel.map(String::from),
            duration_text: Some("4:19".to_string()),
            thumbnail_url: Some(format!("https://i.ytimg.com/vi/{id}/hq.jpg")),
            ..Default::default()
        }
    }

    fn service(
        search: MockSearchProvider,
        resolver: MockStreamResolver,
    ) -> YoutubeService<MockSearchProvider, MockStreamResolver> {
        YoutubeService::new(search, resolver, YoutubeServiceOptions::default())
    }

    #[tokio::test]
    async fn test_search_song_returns_best_match() {
        let mut search = MockSearchProvider::new();
        search
            .expect_search()
            .with(eq("Wonderwall Oasis official audio"), eq(5usize))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    candidate("cover", "Wonderwall Cover by Jane", None),
                    candidate("official", "Oasis - Wonderwall (Official Audio)", Some("Oasis")),
                    candidate("live", "Oasis Wonderwall Live at Wembley", None),
                ])
            });

        let service = service(search, MockStreamResolver::new());
        let result = service
            .search_song(&SongQuery::new("Wonderwall", "Oasis", None))
            .await;

        let song = assert_ok!(result).unwrap();
        assert_eq!(song.video_id, "official");
        assert_eq!(song.url, "https://www.youtube.com/watch?v=official");
        assert_eq!(song.thumbnail, "https://i.ytimg.com/vi/official/hq.jpg");
        assert_eq!(song.duration.as_deref(), Some("4:19"));
    }

    #[tokio::test]
    async fn test_search_song_broadens_query_when_empty() {
        let mut search = MockSearchProvider::new();
        search
            .expect_search()
            .with(eq("Wonderwall Oasis official audio"), eq(5usize))
            .times(1)
            .returning(|_, _| Ok(vec![]));
        search
            .expect_search()
            .with(eq("Wonderwall Oasis"), eq(5usize))
            .times(1)
            .returning(|_, _| Ok(vec![candidate("plain", "Wonderwall", None)]));

        let service = service(search, MockStreamResolver::new());
        let song = service
            .search_song(&SongQuery::new("Wonderwall", "Oasis", None))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(song.video_id, "plain");
    }

    #[tokio::test]
    async fn test_search_song_not_found() {
        let mut search = MockSearchProvider::new();
        search.expect_search().times(2).returning(|_, _| Ok(vec![]));

        let service = service(search, MockStreamResolver::new());
        let result = service
            .search_song(&SongQuery::new("Nothing", "Nobody", None))
            .await;

        assert!(assert_ok!(result).is_none());
    }

    #[tokio::test]
    async fn test_search_song_propagates_provider_errors() {
        let mut search = MockSearchProvider::new();
        search
            .expect_search()
            .times(1)
            .returning(|_, _| Err(eyre!("search unavailable")));

        let service = service(search, MockStreamResolver::new());
        let result = service
            .search_song(&SongQuery::new("Wonderwall", "Oasis", None))
            .await;

        let _ = assert_err!(result);
    }

    #[tokio::test]
    async fn test_get_stream_url_from_video_id() {
        let mut resolver = MockStreamResolver::new();
        resolver
            .expect_resolve_best_audio()
            .with(eq("https://www.youtube.com/watch?v=abc"))
            .times(1)
            .returning(|_| {
                Ok(Some(AudioStream {
                    url: "https://media.example/abc".into(),
                    format_label: "medium".into(),
                    bitrate: 129.5,
                }))
            });

        let before = Utc::now();
        let service = service(MockSearchProvider::new(), resolver);
        let stream = service
            .get_stream_url(&VideoTarget::Id("abc".into()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stream.stream_url, "https://media.example/abc");
        assert_eq!(stream.format, "medium");
        assert_eq!(stream.bitrate, 129.5);
        assert!(stream.expires_at >= before + Duration::hours(6));
    }

    #[tokio::test]
    async fn test_get_stream_url_uses_full_url() {
        let mut resolver = MockStreamResolver::new();
        resolver
            .expect_resolve_best_audio()
            .with(eq("https://youtu.be/abc"))
            .times(1)
            .returning(|_| Ok(None));

        let service = service(MockSearchProvider::new(), resolver);
        let stream = service
            .get_stream_url(&VideoTarget::Url("https://youtu.be/abc".into()))
            .await
            .unwrap();

        assert!(stream.is_none());
    }

    #[tokio::test]
    async fn test_get_song_info() {
        let mut resolver = MockStreamResolver::new();
        resolver
            .expect_song_info()
            .with(eq("https://www.youtube.com/watch?v=abc"))
            .times(1)
            .returning(|_| {
                Ok(Some(SongInfo {
                    title: "Wonderwall".into(),
                    duration: 259,
                    thumbnail: String::new(),
                    uploader: "Oasis".into(),
                    view_count: 10,
                    upload_date: "20091008".into(),
                    description: String::new(),
                }))
            });

        let service = service(MockSearchProvider::new(), resolver);
        let info = service.get_song_info("abc").await.unwrap().unwrap();
        assert_eq!(info.uploader, "Oasis");
    }
}
