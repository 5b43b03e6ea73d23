//! `keg status`: print the persisted snapshot without serving.

use crate::app;
use keg_config::{Config, StoreBackend};
use keg_traits::SystemClock;
use std::sync::Arc;

pub fn run_status(cfg: &Config, json: bool) -> eyre::Result<()> {
    if cfg.store.backend == StoreBackend::Memory {
        tracing::warn!("memory backend keeps nothing between runs; showing empty state");
    }
    let store = app::open_store(&cfg.store)?;
    let state = app::build_state(cfg, store, Arc::new(SystemClock::new()))?;
    let out = state.engine.get_scale();
    let events = state.engine.events()?;

    if json {
        let body = serde_json::json!({ "scale": out, "events": events });
        println!("{body}");
        return Ok(());
    }

    let keg = if out.active_keg == 0 {
        "none".to_string()
    } else {
        format!("{} l", out.active_keg)
    };
    println!("pub:        {}", if out.pub_state.is_open { "open" } else { "closed" });
    println!("scale:      {}", if out.is_ok { "ok" } else { "silent" });
    println!("active keg: {keg}{}", if out.is_low { " (low)" } else { "" });
    println!("beers left: {}", out.beers_left);
    println!("beers total: {}", out.beers_total);
    println!(
        "last weight: {} kg ({} ago)",
        out.last_weight_formatted, out.last_at_duration
    );
    let stock: Vec<String> = out
        .warehouse
        .iter()
        .map(|w| format!("{}l×{}", w.keg, w.amount))
        .collect();
    println!(
        "warehouse:  {} ({} beers)",
        stock.join(" "),
        out.warehouse_beer_left
    );
    if let Some(last) = events.last() {
        println!("last event: {last}");
    }
    Ok(())
}
