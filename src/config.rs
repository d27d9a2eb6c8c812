use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, OptionExt, Result};
use serde::{Deserialize, Serialize};

use crate::services::youtube::YoutubeServiceOptions;
use crate::services::youtube::matcher::ScoringWeights;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of search results to score per query
    pub search_limit: usize,
    /// yt-dlp executable, either a name on PATH or a path
    pub yt_dlp_path: String,
    /// Netscape cookies file passed to yt-dlp for signed-in extraction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<String>,
    /// How long resolved stream URLs are advertised as valid
    pub stream_url_ttl_hours: i64,
    /// Longest a single yt-dlp run may take before it is killed
    pub yt_dlp_timeout_secs: u64,
    pub scoring: ScoringWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_limit: 5,
            yt_dlp_path: "yt-dlp".to_string(),
            cookies_file: None,
            stream_url_ttl_hours: 6,
            yt_dlp_timeout_secs: 30,
            scoring: ScoringWeights::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.search_limit == 0 {
            return Err(color_eyre::eyre::eyre!("search_limit must be at least 1"));
        }
        if !(1..=24 * 365).contains(&self.stream_url_ttl_hours) {
            return Err(color_eyre::eyre::eyre!(
                "stream_url_ttl_hours must be between 1 and 8760, got {}",
                self.stream_url_ttl_hours
            ));
        }
        if self.yt_dlp_timeout_secs == 0 {
            return Err(color_eyre::eyre::eyre!("yt_dlp_timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("ytune").join("config.toml"))
    }

    /// Load the default config file if there is one, otherwise use defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the default path, unless a file is already there
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("Could not determine config directory")?;
        if path.exists() {
            tracing::info!("Config already exists at {}", path.display());
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    pub fn yt_dlp_path(&self) -> PathBuf {
        Self::expand_path(&self.yt_dlp_path)
    }

    pub fn cookies_file_path(&self) -> Option<PathBuf> {
        self.cookies_file.as_deref().map(Self::expand_path)
    }

    pub fn yt_dlp_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.yt_dlp_timeout_secs)
    }

    pub fn service_options(&self) -> YoutubeServiceOptions {
        YoutubeServiceOptions {
            search_limit: self.search_limit,
            weights: self.scoring.clone(),
            stream_url_ttl: chrono::Duration::hours(self.stream_url_ttl_hours),
        }
    }
}
