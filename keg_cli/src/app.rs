//! Wiring from a validated `Config` to a running engine.

use crate::http::AppState;
use eyre::WrapErr;
use keg_backends::{FileStore, Gauges, MemoryStore, TimedStore};
use keg_config::{Config, StoreBackend, StoreCfg};
use keg_core::{EngineSettings, ScaleEngine};
use keg_traits::{Clock, KvStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Read and validate the config; built-in defaults apply when no file is given.
pub fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let default = Path::new(crate::cli::DEFAULT_CONFIG);
    let path = match path {
        Some(p) => Some(p),
        None if default.exists() => Some(default),
        None => None,
    };

    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            keg_config::load_toml(&text)
                .wrap_err_with(|| format!("parse config {}", p.display()))?
        }
        None => {
            tracing::debug!("no config file, using defaults");
            Config::default()
        }
    };
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Open the configured backend behind a bounded-time wrapper.
pub fn open_store(cfg: &StoreCfg) -> eyre::Result<Arc<dyn KvStore>> {
    let inner: Arc<dyn KvStore> = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => {
            let path = cfg
                .path
                .as_deref()
                .ok_or_else(|| eyre::eyre!("store.path is required for the file backend"))?;
            Arc::new(FileStore::open(path).wrap_err_with(|| format!("open state file {path}"))?)
        }
    };
    Ok(Arc::new(TimedStore::new(
        inner,
        Duration::from_millis(cfg.timeout_ms),
    )))
}

pub fn build_state(
    cfg: &Config,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
) -> eyre::Result<AppState> {
    let gauges = Arc::new(Gauges::new());
    let engine = ScaleEngine::builder()
        .with_store(store)
        .with_clock(clock)
        .with_metrics(gauges.clone())
        .with_settings(EngineSettings::from(cfg))
        .try_build()?;
    tracing::info!(
        backend = ?cfg.store.backend,
        active_keg = engine.snapshot().active_keg,
        "engine ready"
    );
    Ok(AppState {
        engine: Arc::new(engine),
        gauges,
    })
}
