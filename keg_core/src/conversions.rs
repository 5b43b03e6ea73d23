//! `From` implementations bridging `keg_config` types to `keg_core` types.

use crate::config::{EngineSettings, PubPolicy};
use chrono::Duration;

fn secs(s: u64) -> Duration {
    i64::try_from(s)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

// ── PubPolicy ────────────────────────────────────────────────────────────────

impl From<&keg_config::PubCfg> for PubPolicy {
    fn from(c: &keg_config::PubCfg) -> Self {
        Self {
            liveness_window: secs(c.liveness_window_s),
            notify_after_open: secs(c.notify_after_open_s),
            notify_after_close: secs(c.notify_after_close_s),
        }
    }
}

// ── EngineSettings ───────────────────────────────────────────────────────────

impl From<&keg_config::Config> for EngineSettings {
    fn from(c: &keg_config::Config) -> Self {
        Self {
            min_weight_g: c.scale.min_weight_g,
            max_weight_g: c.scale.max_weight_g,
            guess_tolerance_g: c.scale.guess_tolerance_g,
            event_log_cap: c.store.event_log_cap,
            pub_policy: PubPolicy::from(&c.pub_cfg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_default_settings() {
        let cfg = keg_config::Config::default();
        let s = EngineSettings::from(&cfg);
        let d = EngineSettings::default();
        assert_eq!(s.min_weight_g, d.min_weight_g);
        assert_eq!(s.max_weight_g, d.max_weight_g);
        assert_eq!(s.guess_tolerance_g, d.guess_tolerance_g);
        assert_eq!(s.event_log_cap, d.event_log_cap);
        assert_eq!(s.pub_policy, d.pub_policy);
    }
}
