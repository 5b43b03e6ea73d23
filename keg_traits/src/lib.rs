pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// Error type crossing the trait boundaries; the core maps it to `KegError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Durable string key-value store with an append-only, capped event log.
///
/// `get` returns `Ok(None)` for a key that was never written.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError>;
    fn set(&self, key: &str, value: &str) -> Result<(), BoxError>;
    /// Append `entry` and keep only the most recent `cap` entries.
    fn append_event(&self, entry: &str, cap: usize) -> Result<(), BoxError>;
    /// Event log, oldest first.
    fn events(&self) -> Result<Vec<String>, BoxError>;
}

/// Fire-and-forget telemetry sink.
pub trait Metrics: Send + Sync {
    fn set_weight(&self, grams: f64);
    fn set_active_keg(&self, keg: i32);
    fn set_beers_left(&self, beers: i32);
    /// Monotonic counter; negative deltas are ignored by implementations.
    fn add_beers_total(&self, beers: i32);
    fn set_rssi(&self, rssi: f64);
    /// Unix seconds of the last liveness ping.
    fn set_last_ping(&self, unix_secs: i64);
    fn set_pub_open(&self, open: bool);
}

/// Outbound notification channel (chat bot, webhook).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> Result<(), BoxError>;
}
