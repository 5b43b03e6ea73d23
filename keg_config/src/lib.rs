#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and weight-trace parsing for the keg scale service.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section is optional and falls back to production defaults.
//! - The weight-trace CSV loader feeds `keg replay`.
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerCfg {
    /// Listen address for the HTTP API
    pub bind: String,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreCfg {
    pub backend: StoreBackend,
    /// JSON document for the `file` backend
    pub path: Option<String>,
    /// Upper bound for a single store call (ms)
    pub timeout_ms: u64,
    /// Entries kept in the event log
    pub event_log_cap: usize,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: None,
            timeout_ms: 2000,
            event_log_cap: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScaleCfg {
    pub min_weight_g: f64,
    pub max_weight_g: f64,
    /// Full-weight match window for keg detection (grams, exclusive)
    pub guess_tolerance_g: f64,
    /// Period of the pub-closed check (ms)
    pub recheck_interval_ms: u64,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            min_weight_g: 6000.0,
            max_weight_g: 65000.0,
            guess_tolerance_g: 2500.0,
            recheck_interval_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PubCfg {
    /// Pub counts as open while the last ping is younger than this (s)
    pub liveness_window_s: u64,
    /// Announce an opening only this long after the previous one (s)
    pub notify_after_open_s: u64,
    /// ...and this long after the previous close (s)
    pub notify_after_close_s: u64,
}

impl Default for PubCfg {
    fn default() -> Self {
        Self {
            liveness_window_s: 600,
            notify_after_open_s: 12 * 3600,
            notify_after_close_s: 3 * 3600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotifyCfg {
    /// Webhook for "pub is open" announcements; logged only when absent
    pub open_webhook: Option<String>,
    /// Webhook for keg events; logged only when absent
    pub keg_webhook: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NotifyCfg {
    fn default() -> Self {
        Self {
            open_webhook: None,
            keg_webhook: None,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub server: ServerCfg,
    pub store: StoreCfg,
    pub scale: ScaleCfg,
    #[serde(rename = "pub")]
    pub pub_cfg: PubCfg,
    pub notify: NotifyCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn check_webhook(name: &str, url: Option<&str>) -> eyre::Result<()> {
    if let Some(url) = url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        eyre::bail!("{name} must be an http(s) URL, got {url:?}");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Server
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            eyre::bail!("server.bind must be a socket address like 0.0.0.0:8080");
        }

        // Store
        if self.store.timeout_ms == 0 {
            eyre::bail!("store.timeout_ms must be > 0");
        }
        if self.store.event_log_cap == 0 {
            eyre::bail!("store.event_log_cap must be >= 1");
        }
        if self.store.backend == StoreBackend::File
            && self.store.path.as_deref().is_none_or(|p| p.trim().is_empty())
        {
            eyre::bail!("store.path is required for the file backend");
        }

        // Scale
        if !(self.scale.min_weight_g.is_finite() && self.scale.max_weight_g.is_finite()) {
            eyre::bail!("scale weight range must be finite");
        }
        if self.scale.min_weight_g > self.scale.max_weight_g {
            eyre::bail!("scale.min_weight_g must not exceed scale.max_weight_g");
        }
        if self.scale.guess_tolerance_g.is_nan() || self.scale.guess_tolerance_g <= 0.0 {
            eyre::bail!("scale.guess_tolerance_g must be > 0");
        }
        if self.scale.recheck_interval_ms == 0 {
            eyre::bail!("scale.recheck_interval_ms must be > 0");
        }

        // Pub
        if self.pub_cfg.liveness_window_s == 0 {
            eyre::bail!("pub.liveness_window_s must be > 0");
        }

        // Notify
        if self.notify.timeout_ms == 0 {
            eyre::bail!("notify.timeout_ms must be > 0");
        }
        check_webhook("notify.open_webhook", self.notify.open_webhook.as_deref())?;
        check_webhook("notify.keg_webhook", self.notify.keg_webhook.as_deref())?;

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Weight-trace CSV schema.
///
/// Expected headers:
/// offset_s,weight
///
/// `offset_s` is seconds since the start of the trace; an empty `weight`
/// is a liveness ping without a measurement.
///
/// Example:
/// offset_s,weight
/// 0,16400
/// 5,16600
/// 60,
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TraceRow {
    pub offset_s: u64,
    pub weight: Option<f64>,
}

/// Load a weight trace; offsets must not go backwards.
pub fn load_trace_csv(path: &Path) -> eyre::Result<Vec<TraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = rdr.headers()?.clone();
    if headers.iter().collect::<Vec<_>>() != ["offset_s", "weight"] {
        eyre::bail!("trace CSV must have headers offset_s,weight");
    }

    let mut rows = Vec::new();
    for (i, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("trace row {}: {e}", i + 1))?;
        if let Some(prev) = rows.last().map(|r: &TraceRow| r.offset_s)
            && row.offset_s < prev
        {
            eyre::bail!("trace row {}: offset_s goes backwards", i + 1);
        }
        rows.push(row);
    }
    Ok(rows)
}
