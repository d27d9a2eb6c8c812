use std::path::PathBuf;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::Deserialize;
use tokio::process::Command;

use super::types::{AudioStream, SongInfo};
use crate::ports::youtube::StreamResolver;

/// Longest description returned by [`StreamResolver::song_info`], in characters.
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Subset of the `yt-dlp -J` output the service reads.
#[derive(Debug, Default, Deserialize)]
pub struct YtDlpInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpFormat {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Average audio bitrate in kbit/s.
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl YtDlpFormat {
    fn is_audio_only(&self) -> bool {
        self.acodec.as_deref() != Some("none")
            && matches!(self.vcodec.as_deref(), None | Some("none"))
    }
}

/// Resolves stream URLs and metadata by shelling out to `yt-dlp`.
pub struct YtDlpAdapter {
    binary: PathBuf,
    cookies_file: Option<PathBuf>,
    timeout: Duration,
}

impl YtDlpAdapter {
    /// `cookies_file` is handed to yt-dlp for videos that require a signed-in session.
    /// A run taking longer than `timeout` is killed and reported as an error.
    pub fn new(binary: PathBuf, cookies_file: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary,
            cookies_file,
            timeout,
        }
    }

    async fn extract_info(&self, video_url: &str, format: Option<&str>) -> Result<YtDlpInfo> {
        let binary = which::which(&self.binary).map_err(|_| {
            eyre!(
                "{} not found in PATH. Please install yt-dlp and ensure it's available.",
                self.binary.display()
            )
        })?;

        let mut command = Command::new(binary);
        command.args(["-J", "--no-warnings", "--no-playlist", "--skip-download"]);
        if let Some(format) = format {
            command.args(["-f", format]);
        }
        if let Some(cookies_file) = &self.cookies_file {
            command.arg("--cookies").arg(cookies_file);
        }
        // `--` keeps a URL starting with '-' from being read as an option.
        command.arg("--").arg(video_url);
        // The child must not outlive a timed out or abandoned request.
        command.kill_on_drop(true);

        tracing::debug!("Running yt-dlp for {}", video_url);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                eyre!(
                    "yt-dlp timed out after {}s for {}",
                    self.timeout.as_secs_f64(),
                    video_url
                )
            })?
            .wrap_err("Failed to run yt-dlp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(eyre!("yt-dlp failed for {}: {}", video_url, stderr.trim()));
        }

        serde_json::from_slice(&output.stdout)
            .wrap_err_with(|| format!("Failed to parse yt-dlp output for {}", video_url))
    }
}

#[async_trait::async_trait]
impl StreamResolver for YtDlpAdapter {
    async fn resolve_best_audio(&self, video_url: &str) -> Result<Option<AudioStream>> {
        let info = self.extract_info(video_url, Some("bestaudio/best")).await?;
        let stream = pick_best_audio(&info.formats);
        if stream.is_none() {
            tracing::warn!(
                "No audio-only format among {} formats for {}",
                info.formats.len(),
                video_url
            );
        }
        Ok(stream)
    }

    async fn song_info(&self, video_url: &str) -> Result<Option<SongInfo>> {
        let info = self.extract_info(video_url, None).await?;
        Ok(Some(to_song_info(info)))
    }
}

/// Choose the audio-only format with the highest bitrate. Formats without a
/// bitrate rank as 0 and, among equals, the earliest listed wins.
pub fn pick_best_audio(formats: &[YtDlpFormat]) -> Option<AudioStream> {
    let mut audio: Vec<&YtDlpFormat> = formats
        .iter()
        .filter(|format| format.is_audio_only() && format.url.is_some())
        .collect();

    audio.sort_by(|a, b| {
        b.abr
            .unwrap_or(0.0)
            .partial_cmp(&a.abr.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let best = audio.into_iter().next()?;
    Some(AudioStream {
        url: best.url.clone()?,
        format_label: best
            .format_note
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        bitrate: best.abr.unwrap_or(0.0),
    })
}

fn to_song_info(info: YtDlpInfo) -> SongInfo {
    SongInfo {
        title: info.title.unwrap_or_default(),
        duration: info
            .duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(|secs| secs.round() as u64)
            .unwrap_or(0),
        thumbnail: info.thumbnail.unwrap_or_default(),
        uploader: info.uploader.unwrap_or_default(),
        view_count: info.view_count.unwrap_or(0),
        upload_date: info.upload_date.unwrap_or_default(),
        description: info
            .description
            .map(|description| description.chars().take(MAX_DESCRIPTION_CHARS).collect())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(acodec: Option<&str>, vcodec: Option<&str>, abr: Option<f64>, note: &str) -> YtDlpFormat {
        YtDlpFormat {
            url: Some(format!("https://media.example/{note}")),
            acodec: acodec.map(String::from),
            vcodec: vcodec.map(String::from),
            abr,
            format_note: Some(note.to_string()),
        }
    }

    #[test]
    fn test_picks_highest_bitrate_audio_only() {
        let formats = vec![
            format(Some("mp4a.40.5"), Some("none"), Some(48.0), "low"),
            format(Some("opus"), Some("none"), Some(160.0), "medium"),
            format(Some("opus"), Some("avc1"), Some(256.0), "muxed"),
            format(Some("none"), Some("vp9"), None, "video"),
        ];

        let best = pick_best_audio(&formats).unwrap();
        assert_eq!(best.format_label, "medium");
        assert_eq!(best.bitrate, 160.0);
        assert_eq!(best.url, "https://media.example/medium");
    }

    #[test]
    fn test_missing_vcodec_counts_as_audio_only() {
        let formats = vec![format(Some("opus"), None, Some(70.0), "audio")];
        assert_eq!(pick_best_audio(&formats).unwrap().format_label, "audio");
    }

    #[test]
    fn test_missing_bitrate_ranks_last_and_ties_keep_order() {
        let formats = vec![
            format(Some("opus"), Some("none"), None, "unknown-rate"),
            format(Some("opus"), Some("none"), Some(50.0), "first"),
            format(Some("opus"), Some("none"), Some(50.0), "second"),
        ];
        assert_eq!(pick_best_audio(&formats).unwrap().format_label, "first");
    }

    #[test]
    fn test_formats_without_url_are_skipped() {
        let mut no_url = format(Some("opus"), Some("none"), Some(160.0), "no-url");
        no_url.url = None;
        let formats = vec![no_url, format(Some("opus"), Some("none"), Some(50.0), "ok")];
        assert_eq!(pick_best_audio(&formats).unwrap().format_label, "ok");
    }

    #[test]
    fn test_no_audio_formats() {
        let formats = vec![format(Some("none"), Some("vp9"), None, "video")];
        assert!(pick_best_audio(&formats).is_none());
        assert!(pick_best_audio(&[]).is_none());
    }

    #[test]
    fn test_parses_yt_dlp_json() {
        let raw = r#"{
            "id": "abc",
            "title": "Wonderwall",
            "duration": 258.6,
            "uploader": "Oasis",
            "view_count": 1000,
            "upload_date": "20091008",
            "formats": [
                {"format_id": "251", "url": "https://media.example/251", "acodec": "opus", "vcodec": "none", "abr": 130.5, "format_note": "medium"},
                {"format_id": "18", "url": "https://media.example/18", "acodec": "mp4a.40.2", "vcodec": "avc1.42001E"}
            ]
        }"#;

        let info: YtDlpInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.formats.len(), 2);
        assert_eq!(pick_best_audio(&info.formats).unwrap().bitrate, 130.5);

        let song = to_song_info(info);
        assert_eq!(song.title, "Wonderwall");
        assert_eq!(song.duration, 259);
        assert_eq!(song.thumbnail, "");
        assert_eq!(song.upload_date, "20091008");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_yt_dlp_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let script = std::env::temp_dir().join(format!("ytune-hung-yt-dlp-{}", std::process::id()));
        std::fs::write(&script, "#!/bin/sh\nsleep 10\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let adapter = YtDlpAdapter::new(script.clone(), None, Duration::from_millis(300));
        let started = std::time::Instant::now();
        let result = adapter
            .resolve_best_audio("https://www.youtube.com/watch?v=abc")
            .await;
        let elapsed = started.elapsed();
        std::fs::remove_file(&script).ok();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"), "unexpected error: {err}");
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let adapter = YtDlpAdapter::new(
            PathBuf::from("ytune-no-such-yt-dlp"),
            None,
            Duration::from_secs(1),
        );
        let err = adapter.song_info("https://www.youtube.com/watch?v=abc").await.unwrap_err();
        assert!(err.to_string().contains("not found in PATH"));
    }

    #[test]
    fn test_description_is_truncated() {
        let info = YtDlpInfo {
            description: Some("é".repeat(600)),
            ..Default::default()
        };
        assert_eq!(to_song_info(info).description.chars().count(), 500);
    }
}
