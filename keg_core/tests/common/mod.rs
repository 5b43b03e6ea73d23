#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use crossbeam_channel as xch;
use keg_backends::MemoryStore;
use keg_core::{Event, EventKind, ScaleEngine};
use keg_traits::{KvStore, ManualClock};
use std::sync::Arc;
use std::time::Duration;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 17, 0, 0).unwrap()
}

pub struct Rig {
    pub engine: Arc<ScaleEngine>,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
}

pub fn rig() -> Rig {
    rig_with_store(Arc::new(MemoryStore::new()))
}

pub fn rig_with_store(store: Arc<MemoryStore>) -> Rig {
    let clock = ManualClock::starting_at(t0());
    let engine = ScaleEngine::builder()
        .with_store(store.clone())
        .with_clock(Arc::new(clock.clone()))
        .try_build()
        .expect("engine builds");
    Rig {
        engine: Arc::new(engine),
        store,
        clock,
    }
}

/// Forward every event of `kind` into a channel.
pub fn record(engine: &ScaleEngine, kind: EventKind) -> xch::Receiver<Event> {
    let (tx, rx) = xch::unbounded();
    engine.on_event(kind, move |e| {
        tx.send(e.clone()).ok();
        Ok(())
    });
    rx
}

pub fn next(rx: &xch::Receiver<Event>) -> Event {
    rx.recv_timeout(Duration::from_secs(2))
        .expect("event within 2s")
}

pub fn nothing_more(rx: &xch::Receiver<Event>) {
    assert!(
        rx.recv_timeout(Duration::from_millis(100)).is_err(),
        "unexpected extra event"
    );
}

pub fn stored(store: &MemoryStore, key: &str) -> Option<String> {
    store.get(key).unwrap()
}
