use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generation capability behind a trait object so tests swap in a mock.
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
}
