//! Maps `Box<dyn Error>` from the `KvStore` boundary to typed `KegError`.
//!
//! The traits in `keg_traits` use `Box<dyn Error + Send + Sync>` so any backend
//! can plug in; this module converts those to our typed error enum, with an
//! optional feature-gated path for `keg_backends::StoreError` downcasting.

use crate::error::KegError;

/// Map a store-boundary error to a typed `KegError`.
///
/// Attempts to downcast known backend error types first, then falls back
/// to string-based heuristics.
pub fn map_store_error(e: &(dyn std::error::Error + 'static)) -> KegError {
    #[cfg(feature = "backend-errors")]
    {
        if let Some(se) = e.downcast_ref::<keg_backends::StoreError>() {
            return match se {
                keg_backends::StoreError::Timeout(_) => KegError::StoreTimeout,
                other => KegError::Store(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        KegError::StoreTimeout
    } else {
        KegError::Store(s)
    }
}
