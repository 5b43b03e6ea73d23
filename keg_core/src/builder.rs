//! Builder for [`ScaleEngine`].
//!
//! Only the store is mandatory. Clock, metrics and settings default to the
//! wall clock, a no-op sink and [`EngineSettings::default`].

use std::sync::Arc;

use keg_traits::{Clock, KvStore, Metrics, SystemClock};

use crate::config::EngineSettings;
use crate::engine::ScaleEngine;
use crate::error::{BuildError, Result};
use crate::mocks::NoopMetrics;
use crate::persist::Persistence;

impl ScaleEngine {
    /// Start building an engine.
    pub fn builder() -> ScaleEngineBuilder {
        ScaleEngineBuilder::default()
    }
}

#[derive(Default)]
pub struct ScaleEngineBuilder {
    store: Option<Arc<dyn KvStore>>,
    clock: Option<Arc<dyn Clock>>,
    metrics: Option<Arc<dyn Metrics>>,
    settings: Option<EngineSettings>,
}

impl ScaleEngineBuilder {
    pub fn with_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Validate inputs, load persisted state and start the event dispatcher.
    pub fn try_build(self) -> Result<ScaleEngine> {
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        let settings = self.settings.unwrap_or_default();
        settings
            .check()
            .map_err(|why| eyre::Report::new(BuildError::InvalidSettings(why)))?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let metrics = self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics));

        Ok(ScaleEngine::from_parts(
            Persistence::new(store),
            clock,
            metrics,
            settings,
        ))
    }
}

impl std::fmt::Debug for ScaleEngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaleEngineBuilder")
            .field("store", &self.store.is_some())
            .field("clock", &self.clock.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}
