//! Concrete adapters for the `keg_traits` seams.
//!
//! - `memory`: process-local store, the default and the test double
//! - `file`: JSON document on disk, rewritten atomically on every change
//! - `timed`: wraps any store and bounds each call with a timeout
//! - `metrics`: lock-free gauges with a serializable snapshot
//! - `notify`: log and webhook notifiers

pub mod error;
pub mod file;
pub mod memory;
pub mod metrics;
pub mod notify;
pub mod timed;

pub use error::{NotifyError, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use metrics::{GaugeSnapshot, Gauges};
pub use notify::{LogNotifier, WebhookNotifier};
pub use timed::TimedStore;
