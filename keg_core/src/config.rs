//! Runtime settings for the scale engine.
//!
//! These are separate from the TOML-deserialized config in `keg_config`;
//! see `conversions` for the bridge.

use crate::keg::DEFAULT_GUESS_TOLERANCE_G;
use chrono::Duration;

/// Limits and tuning for measurement handling.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Readings below this are dropped as sensor noise (grams).
    pub min_weight_g: f64,
    /// Readings above this are dropped (grams).
    pub max_weight_g: f64,
    /// Full-weight match window for keg detection (grams, exclusive).
    pub guess_tolerance_g: f64,
    /// Entries kept in the durable event log.
    pub event_log_cap: usize,
    pub pub_policy: PubPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_weight_g: 6000.0,
            max_weight_g: 65000.0,
            guess_tolerance_g: DEFAULT_GUESS_TOLERANCE_G,
            event_log_cap: 500,
            pub_policy: PubPolicy::default(),
        }
    }
}

impl EngineSettings {
    pub(crate) fn check(&self) -> Result<(), &'static str> {
        if !(self.min_weight_g.is_finite() && self.max_weight_g.is_finite()) {
            return Err("weight range must be finite");
        }
        if self.min_weight_g > self.max_weight_g {
            return Err("min_weight_g must not exceed max_weight_g");
        }
        if self.guess_tolerance_g.is_nan() || self.guess_tolerance_g <= 0.0 {
            return Err("guess_tolerance_g must be > 0");
        }
        if self.event_log_cap == 0 {
            return Err("event_log_cap must be >= 1");
        }
        self.pub_policy.check()
    }
}

/// Open/closed detection windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubPolicy {
    /// The pub is alive while the last ping is younger than this.
    pub liveness_window: Duration,
    /// Minimum time since the previous opening before an open is announced.
    pub notify_after_open: Duration,
    /// Minimum time since the previous close before an open is announced.
    pub notify_after_close: Duration,
}

impl Default for PubPolicy {
    fn default() -> Self {
        Self {
            liveness_window: Duration::minutes(10),
            notify_after_open: Duration::hours(12),
            notify_after_close: Duration::hours(3),
        }
    }
}

impl PubPolicy {
    fn check(&self) -> Result<(), &'static str> {
        if self.liveness_window <= Duration::zero() {
            return Err("liveness window must be positive");
        }
        if self.notify_after_open < Duration::zero() || self.notify_after_close < Duration::zero() {
            return Err("notification windows must not be negative");
        }
        Ok(())
    }
}
