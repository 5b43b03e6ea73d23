//! In-process gauges implementing [`Metrics`].

use keg_traits::Metrics;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Gauges {
    weight_bits: AtomicU64,
    active_keg: AtomicI64,
    beers_left: AtomicI64,
    beers_total: AtomicI64,
    rssi_bits: AtomicU64,
    last_ping: AtomicI64,
    pub_open: AtomicBool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeSnapshot {
    pub weight: f64,
    pub active_keg: i64,
    pub beers_left: i64,
    pub beers_total: i64,
    pub rssi: f64,
    pub last_ping: i64,
    /// 0 or 1
    pub pub_open: u8,
}

impl Gauges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            weight: f64::from_bits(self.weight_bits.load(Ordering::Relaxed)),
            active_keg: self.active_keg.load(Ordering::Relaxed),
            beers_left: self.beers_left.load(Ordering::Relaxed),
            beers_total: self.beers_total.load(Ordering::Relaxed),
            rssi: f64::from_bits(self.rssi_bits.load(Ordering::Relaxed)),
            last_ping: self.last_ping.load(Ordering::Relaxed),
            pub_open: u8::from(self.pub_open.load(Ordering::Relaxed)),
        }
    }
}

impl Metrics for Gauges {
    fn set_weight(&self, grams: f64) {
        self.weight_bits.store(grams.to_bits(), Ordering::Relaxed);
    }

    fn set_active_keg(&self, keg: i32) {
        self.active_keg.store(i64::from(keg), Ordering::Relaxed);
    }

    fn set_beers_left(&self, beers: i32) {
        self.beers_left.store(i64::from(beers), Ordering::Relaxed);
    }

    fn add_beers_total(&self, beers: i32) {
        if beers > 0 {
            self.beers_total
                .fetch_add(i64::from(beers), Ordering::Relaxed);
        }
    }

    fn set_rssi(&self, rssi: f64) {
        self.rssi_bits.store(rssi.to_bits(), Ordering::Relaxed);
    }

    fn set_last_ping(&self, unix_secs: i64) {
        self.last_ping.store(unix_secs, Ordering::Relaxed);
    }

    fn set_pub_open(&self, open: bool) {
        self.pub_open.store(open, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_ignores_negative_deltas() {
        let g = Gauges::new();
        g.add_beers_total(20);
        g.add_beers_total(-5);
        g.add_beers_total(0);
        g.add_beers_total(30);
        assert_eq!(g.snapshot().beers_total, 50);
    }

    #[test]
    fn snapshot_reflects_latest_values() {
        let g = Gauges::new();
        g.set_weight(16432.5);
        g.set_rssi(-70.25);
        g.set_active_keg(15);
        g.set_pub_open(true);
        let s = g.snapshot();
        assert_eq!(s.weight, 16432.5);
        assert_eq!(s.rssi, -70.25);
        assert_eq!(s.active_keg, 15);
        assert_eq!(s.pub_open, 1);
    }
}
