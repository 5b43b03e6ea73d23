//! Test and helper mocks for keg_core

use keg_traits::{BoxError, KvStore, Metrics};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Metrics sink that drops everything; useful when only state matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn set_weight(&self, _grams: f64) {}
    fn set_active_keg(&self, _keg: i32) {}
    fn set_beers_left(&self, _beers: i32) {}
    fn add_beers_total(&self, _beers: i32) {}
    fn set_rssi(&self, _rssi: f64) {}
    fn set_last_ping(&self, _unix_secs: i64) {}
    fn set_pub_open(&self, _open: bool) {}
}

/// Store wrapper whose reads and writes can be switched to fail, for
/// exercising persistence error paths.
pub struct FlakyKv {
    inner: Arc<dyn KvStore>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyKv {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Fail `set` and `append_event`.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }
}

impl KvStore for FlakyKv {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(format!("flaky store: read {key} refused").into());
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(format!("flaky store: write {key} refused").into());
        }
        self.inner.set(key, value)
    }

    fn append_event(&self, entry: &str, cap: usize) -> Result<(), BoxError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("flaky store: event log refused".into());
        }
        self.inner.append_event(entry, cap)
    }

    fn events(&self) -> Result<Vec<String>, BoxError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err("flaky store: event log read refused".into());
        }
        self.inner.events()
    }
}
