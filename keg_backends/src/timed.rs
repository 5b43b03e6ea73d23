//! Bounded-time wrapper for any [`KvStore`].
//!
//! Calls run on one worker thread that owns the inner store; the caller waits
//! with `recv_timeout` and gets [`StoreError::Timeout`] when the store is slow.
//! A timed-out call still completes on the worker, and later calls queue
//! behind it.
use crate::error::StoreError;
use crossbeam_channel as xch;
use keg_traits::{BoxError, KvStore};
use std::sync::Arc;
use std::time::Duration;

type Job = Box<dyn FnOnce(&dyn KvStore) + Send>;

pub struct TimedStore {
    tx: Option<xch::Sender<Job>>,
    timeout: Duration,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn KvStore>, timeout: Duration) -> Self {
        let (tx, rx) = xch::unbounded::<Job>();
        let join_handle = std::thread::Builder::new()
            .name("keg-store".into())
            .spawn(move || {
                for job in rx.iter() {
                    job(inner.as_ref());
                }
                tracing::trace!("store worker exiting cleanly");
            });

        let join_handle = match join_handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(error = %e, "could not start store worker; every call will fail");
                None
            }
        };

        Self {
            tx: Some(tx),
            timeout,
            join_handle,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn call<T, F>(&self, f: F) -> Result<T, BoxError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KvStore) -> Result<T, BoxError> + Send + 'static,
    {
        let tx = self.tx.as_ref().ok_or(StoreError::WorkerGone)?;
        let (reply_tx, reply_rx) = xch::bounded(1);
        tx.send(Box::new(move |store: &dyn KvStore| {
            // Receiver may have timed out already.
            let _ = reply_tx.send(f(store));
        }))
        .map_err(|_| StoreError::WorkerGone)?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(res) => res,
            Err(xch::RecvTimeoutError::Timeout) => {
                tracing::warn!(timeout = ?self.timeout, "store call timed out");
                Err(StoreError::Timeout(self.timeout).into())
            }
            Err(xch::RecvTimeoutError::Disconnected) => Err(StoreError::WorkerGone.into()),
        }
    }
}

impl KvStore for TimedStore {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        let key = key.to_string();
        self.call(move |s| s.get(&key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.call(move |s| s.set(&key, &value))
    }

    fn append_event(&self, entry: &str, cap: usize) -> Result<(), BoxError> {
        let entry = entry.to_string();
        self.call(move |s| s.append_event(&entry, cap))
    }

    fn events(&self) -> Result<Vec<String>, BoxError> {
        self.call(|s| s.events())
    }
}

impl Drop for TimedStore {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("store worker joined successfully"),
                Err(e) => tracing::warn!(?e, "store worker panicked during shutdown"),
            }
        }
    }
}

impl std::fmt::Debug for TimedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
