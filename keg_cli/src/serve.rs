//! `keg serve`: HTTP ingestion, status API and the recheck ticker.

use crate::{app, http, notifications};
use eyre::WrapErr;
use keg_config::Config;
use keg_core::Rechecker;
use keg_traits::SystemClock;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub fn run_serve(cfg: &Config, bind: Option<&str>) -> eyre::Result<()> {
    let bind = bind.unwrap_or(cfg.server.bind.as_str());
    let addr: SocketAddr = bind
        .parse()
        .wrap_err_with(|| format!("invalid configuration: bad listen address {bind:?}"))?;

    let store = app::open_store(&cfg.store)?;
    let state = app::build_state(cfg, store, Arc::new(SystemClock::new()))?;
    notifications::register(&state.engine, &cfg.notify);

    let rechecker = Rechecker::spawn(
        state.engine.clone(),
        Duration::from_millis(cfg.scale.recheck_interval_ms),
    );

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let stop_tx = Mutex::new(Some(stop_tx));
    ctrlc::set_handler(move || {
        let tx = stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            tracing::info!("shutdown requested");
            let _ = tx.send(());
        }
    })
    .wrap_err("install Ctrl-C handler")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("keg-http")
        .build()
        .wrap_err("start async runtime")?;

    // Held outside the runtime so the engine and its blocking clients drop here.
    let state = Arc::new(state);
    let router = http::build_router(state.clone());
    let served: eyre::Result<()> = rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .wrap_err_with(|| format!("bind {addr}"))?;
        tracing::info!(%addr, "listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
            .wrap_err("http server failed")?;
        Ok(())
    });

    rechecker.stop();
    drop(state);
    tracing::info!("stopped");
    served
}
