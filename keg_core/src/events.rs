//! Domain events and their asynchronous dispatch.
//!
//! `EventBus` owns one dispatcher thread fed by an unbounded channel, so
//! `dispatch` never blocks the caller on the event log or on hooks. For every
//! event the worker appends `"<name> AT <rfc3339>"` to the durable log and then
//! runs the hooks registered for its kind, in registration order.
//!
//! Delivery is best-effort: failures are logged and never retried, and events
//! still queued when the bus is dropped are discarded.
use chrono::{DateTime, SecondsFormat, Utc};
use crossbeam_channel as xch;
use keg_traits::{BoxError, KvStore};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PubOpened,
    PubClosed,
    NewKegTapped,
}

impl EventKind {
    /// Stable name written to the event log.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::PubOpened => "pub_open",
            EventKind::PubClosed => "pub_close",
            EventKind::NewKegTapped => "new_keg_tapped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A state transition plus the figures hooks usually want to report.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub at: DateTime<Utc>,
    pub active_keg: i32,
    pub beers_left: i32,
    pub warehouse_beers: i64,
}

impl Event {
    pub fn log_entry(&self) -> String {
        format!(
            "{} AT {}",
            self.kind,
            self.at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Callback run on the dispatcher thread.
pub trait Hook: Send + Sync {
    fn call(&self, event: &Event) -> Result<(), BoxError>;
}

impl<F> Hook for F
where
    F: Fn(&Event) -> Result<(), BoxError> + Send + Sync,
{
    fn call(&self, event: &Event) -> Result<(), BoxError> {
        self(event)
    }
}

type HookMap = HashMap<EventKind, Vec<Arc<dyn Hook>>>;

pub struct EventBus {
    hooks: Arc<RwLock<HookMap>>,
    tx: Option<xch::Sender<Event>>,
    /// Shutdown flag checked between events
    shutdown: Arc<AtomicBool>,
    /// Events queued or being delivered
    pending: Arc<AtomicUsize>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl EventBus {
    /// Start the dispatcher thread. `log_cap` bounds the durable event log.
    pub fn spawn(store: Arc<dyn KvStore>, log_cap: usize) -> Self {
        let (tx, rx) = xch::unbounded::<Event>();
        let hooks: Arc<RwLock<HookMap>> = Arc::default();
        let hooks_worker = hooks.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_worker = shutdown.clone();
        let pending: Arc<AtomicUsize> = Arc::default();
        let pending_worker = pending.clone();

        let join_handle = std::thread::Builder::new()
            .name("keg-events".into())
            .spawn(move || {
                for event in rx.iter() {
                    if shutdown_worker.load(Ordering::Relaxed) {
                        tracing::debug!("event dispatcher received shutdown signal");
                        break;
                    }
                    deliver(store.as_ref(), &hooks_worker, log_cap, &event);
                    pending_worker.fetch_sub(1, Ordering::AcqRel);
                }
                tracing::trace!("event dispatcher exiting cleanly");
            });

        let join_handle = match join_handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(error = %e, "could not start event dispatcher; events will be dropped");
                None
            }
        };

        Self {
            hooks,
            tx: Some(tx),
            shutdown,
            pending,
            join_handle,
        }
    }

    /// Append a hook for `kind`. Duplicates are kept.
    pub fn register(&self, kind: EventKind, hook: Arc<dyn Hook>) {
        let mut map = self.hooks.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(kind).or_default().push(hook);
    }

    /// Closure convenience for [`EventBus::register`].
    pub fn on<F>(&self, kind: EventKind, f: F)
    where
        F: Fn(&Event) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(f));
    }

    pub fn hook_count(&self, kind: EventKind) -> usize {
        let map = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&kind).map_or(0, Vec::len)
    }

    /// Queue an event; returns immediately.
    pub fn dispatch(&self, event: Event) {
        let Some(tx) = &self.tx else { return };
        self.pending.fetch_add(1, Ordering::AcqRel);
        if tx.send(event).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!("event dispatcher is gone; event dropped");
        }
    }

    /// Block until every queued event has been delivered, or `timeout` passes.
    /// Returns whether the bus went idle.
    pub fn wait_idle(&self, timeout: std::time::Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.pending.load(Ordering::Acquire) > 0 {
            if self.join_handle.is_none() || std::time::Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        true
    }
}

fn deliver(store: &dyn KvStore, hooks: &RwLock<HookMap>, log_cap: usize, event: &Event) {
    if let Err(e) = store.append_event(&event.log_entry(), log_cap) {
        tracing::error!(event = %event.kind, error = %e, "failed to add event");
    }

    // Clone the list so hooks run without holding the registry lock.
    let list: Vec<Arc<dyn Hook>> = {
        let map = hooks.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&event.kind).cloned().unwrap_or_default()
    };
    for (idx, hook) in list.iter().enumerate() {
        if let Err(e) = hook.call(event) {
            tracing::error!(event = %event.kind, hook = idx, error = %e, "event hook failed");
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Disconnect so an idle worker wakes up and exits.
        self.tx.take();

        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("event dispatcher joined successfully"),
                Err(e) => tracing::warn!(?e, "event dispatcher panicked during shutdown"),
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<_> = map.iter().map(|(k, v)| (k.name(), v.len())).collect();
        kinds.sort_unstable();
        f.debug_struct("EventBus").field("hooks", &kinds).finish()
    }
}
