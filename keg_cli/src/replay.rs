//! `keg replay`: run a recorded weight trace through an in-memory engine.
//!
//! Each row advances a manual clock to `start + offset_s`, runs the periodic
//! recheck, then pings and (when a weight is present) measures, the same
//! sequence a live push goes through.

use crate::app;
use chrono::{DateTime, Duration, Utc};
use keg_backends::MemoryStore;
use keg_config::{Config, TraceRow};
use keg_core::{Event, EventKind, ScaleEngine};
use keg_traits::ManualClock;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Serialize)]
struct Step {
    offset_s: u64,
    weight: Option<f64>,
    active_keg: i32,
    candidate_keg: i32,
    beers_left: i32,
    beers_total: i32,
    is_low: bool,
    is_open: bool,
}

fn step(row: &TraceRow, engine: &ScaleEngine) -> Step {
    let st = engine.snapshot();
    Step {
        offset_s: row.offset_s,
        weight: row.weight,
        active_keg: st.active_keg,
        candidate_keg: st.candidate_keg,
        beers_left: st.beers_left,
        beers_total: st.beers_total,
        is_low: st.is_low,
        is_open: st.pub_state.is_open,
    }
}

fn print_step(s: &Step, json: bool) -> eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string(s)?);
    } else {
        let weight = s
            .weight
            .map_or_else(|| "-".to_string(), |w| format!("{w:.0}"));
        println!(
            "t+{:>6}s weight={weight:>6} keg={:>2} candidate={:>2} left={:>3} total={:>4}{}{}",
            s.offset_s,
            s.active_keg,
            s.candidate_keg,
            s.beers_left,
            s.beers_total,
            if s.is_low { " low" } else { "" },
            if s.is_open { " open" } else { " closed" },
        );
    }
    Ok(())
}

/// Start of replay time; fixed so output is reproducible.
fn replay_start() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(19_000)
}

fn offset(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

pub fn run_replay(cfg: &Config, trace: &Path, keg: i32, json: bool) -> eyre::Result<()> {
    let rows = keg_config::load_trace_csv(trace)?;
    tracing::info!(rows = rows.len(), trace = %trace.display(), "replaying trace");

    let start = replay_start();
    let clock = ManualClock::starting_at(start);
    let state = app::build_state(cfg, Arc::new(MemoryStore::new()), Arc::new(clock.clone()))?;
    let engine = state.engine;
    if keg != 0 {
        engine.set_active_keg(keg)?;
    }

    // Hooks run on the dispatcher thread; collect and report once it is idle.
    let seen: Arc<Mutex<Vec<Event>>> = Arc::default();
    for kind in [EventKind::PubOpened, EventKind::PubClosed, EventKind::NewKegTapped] {
        let seen = seen.clone();
        engine.on_event(kind, move |ev: &Event| {
            seen.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ev.clone());
            Ok(())
        });
    }

    for row in &rows {
        let at = start.checked_add_signed(offset(row.offset_s)).unwrap_or(start);
        clock.set(at);
        engine.recheck();
        engine.ping();
        if let Some(weight) = row.weight {
            engine.add_measurement(weight)?;
        }
        print_step(&step(row, &engine), json)?;
    }

    let summary = engine.get_scale();
    if !engine.wait_for_events(std::time::Duration::from_secs(5)) {
        tracing::warn!("event dispatcher still busy; event list may be incomplete");
    }
    let events = std::mem::take(&mut *seen.lock().unwrap_or_else(PoisonError::into_inner));

    if json {
        let out = serde_json::json!({
            "events": events.iter().map(|e| e.kind).collect::<Vec<_>>(),
            "scale": summary,
        });
        println!("{out}");
    } else {
        for ev in &events {
            println!(
                "event {} at t+{}s",
                ev.kind,
                (ev.at - start).num_seconds()
            );
        }
        println!(
            "final: keg={} left={} total={} warehouse={}",
            summary.active_keg, summary.beers_left, summary.beers_total, summary.warehouse_beer_left
        );
    }
    Ok(())
}
