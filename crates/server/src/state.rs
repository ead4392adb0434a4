use std::sync::Arc;
use ytdl_core::{BatchScheduler, Config, DownloadsConfig, PlatformRegistry, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Arc<BatchScheduler>,
    registry: Arc<PlatformRegistry>,
}

impl AppState {
    /// `registry` should be the same instance the scheduler resolves with.
    pub fn new(
        config: Config,
        scheduler: Arc<BatchScheduler>,
        registry: Arc<PlatformRegistry>,
    ) -> Self {
        Self {
            config,
            scheduler,
            registry,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Defaults for requests that leave fields out.
    pub fn downloads(&self) -> &DownloadsConfig {
        &self.config.downloads
    }

    pub fn scheduler(&self) -> &Arc<BatchScheduler> {
        &self.scheduler
    }

    pub fn registry(&self) -> &PlatformRegistry {
        self.registry.as_ref()
    }
}
