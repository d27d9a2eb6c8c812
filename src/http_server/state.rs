use crate::ports::youtube::{SearchProvider, StreamResolver};
use crate::services::youtube::YoutubeService;

/// The service as wired into the HTTP server; adapters are boxed so tests can
/// swap in mocks without changing the router's type.
pub type DynYoutubeService = YoutubeService<Box<dyn SearchProvider>, Box<dyn StreamResolver>>;

pub struct AppState {
    pub youtube: DynYoutubeService,
}
