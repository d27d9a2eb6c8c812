pub mod matcher;
pub mod search;
pub mod service;
pub mod types;
pub mod ytdlp;

pub use service::{YoutubeService, YoutubeServiceOptions};
