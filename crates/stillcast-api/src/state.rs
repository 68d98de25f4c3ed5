//! Application state shared by all handlers.

use std::sync::Arc;

use stillcast_core::models::ClipDefaults;
use stillcast_core::Config;
use stillcast_processing::{ClipOrchestrator, ImageFetcher, OutputWorkspace};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub workspace: Arc<OutputWorkspace>,
    pub orchestrator: Arc<ClipOrchestrator>,
}

impl AppState {
    pub fn clip_defaults(&self) -> ClipDefaults {
        ClipDefaults {
            width: self.config.default_width,
            height: self.config.default_height,
        }
    }
}
