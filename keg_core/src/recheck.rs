//! Periodic recheck of the pub state.
//!
//! Each `Rechecker` owns one thread that calls [`ScaleEngine::recheck`] on
//! every tick. Dropping it (or calling [`Rechecker::stop`]) lets an in-flight
//! recheck finish and then joins the thread.
use crate::engine::ScaleEngine;
use crossbeam_channel as xch;
use std::sync::Arc;
use std::time::Duration;

pub struct Rechecker {
    /// Dropping the sender wakes the loop
    shutdown_tx: Option<xch::Sender<()>>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Rechecker {
    pub fn spawn(engine: Arc<ScaleEngine>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = xch::bounded::<()>(0);
        let ticker = xch::tick(interval);

        let join_handle = std::thread::Builder::new()
            .name("keg-recheck".into())
            .spawn(move || {
                loop {
                    xch::select! {
                        recv(ticker) -> _ => engine.recheck(),
                        recv(shutdown_rx) -> _ => {
                            tracing::debug!("recheck thread received shutdown signal");
                            break;
                        }
                    }
                }
                tracing::trace!("recheck thread exiting cleanly");
            });

        let join_handle = match join_handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(error = %e, "could not start recheck thread; pub will never close");
                None
            }
        };

        Self {
            shutdown_tx: Some(shutdown_tx),
            join_handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shutdown_tx.take();
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("recheck thread joined successfully"),
                Err(e) => tracing::warn!(?e, "recheck thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for Rechecker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
