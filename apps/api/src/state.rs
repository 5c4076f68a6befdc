use std::sync::Arc;

use crate::config::Config;
use crate::convert::ImageConverter;
use crate::feedback::FeedbackClient;
use crate::kv::KvStore;
use crate::storage::FileStore;
use crate::upload::page::PageRegistry;

/// The external collaborators the analysis pipeline calls into.
/// Each is a trait object so tests can substitute in-memory fakes.
#[derive(Clone)]
pub struct Services {
    pub files: Arc<dyn FileStore>,
    pub kv: Arc<dyn KvStore>,
    pub ai: Arc<dyn FeedbackClient>,
    pub converter: Arc<dyn ImageConverter>,
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Open upload page sessions, keyed by session id.
    pub pages: Arc<PageRegistry>,
    pub config: Config,
}
