//! Open/closed detection from scale liveness.
//!
//! The scale pings every few seconds while the pub's power is on. A ping after
//! a quiet period opens the pub; a recheck that finds the last ping older than
//! the liveness window closes it. Announcing an opening is debounced so a
//! short power blip does not spam the chat.

use crate::config::PubPolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PubState {
    pub is_open: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl Default for PubState {
    fn default() -> Self {
        Self {
            is_open: false,
            opened_at: DateTime::<Utc>::UNIX_EPOCH,
            closed_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Outcome of [`PubState::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opening {
    /// Already open; nothing changed.
    Unchanged,
    /// Flipped to open; `notify` says whether to announce it.
    Opened { notify: bool },
}

/// Whether the scale was heard from recently enough.
pub fn is_ok(policy: &PubPolicy, now: DateTime<Utc>, last_ok: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_ok) < policy.liveness_window
}

impl PubState {
    /// Whether an opening at `now` should be announced.
    pub fn should_notify_open(&self, policy: &PubPolicy, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.opened_at) >= policy.notify_after_open
            && now.signed_duration_since(self.closed_at) >= policy.notify_after_close
    }

    /// Run on ping. The debounce is evaluated against the previous opening
    /// before `opened_at` is overwritten.
    pub fn open(&mut self, policy: &PubPolicy, now: DateTime<Utc>) -> Opening {
        if self.is_open {
            return Opening::Unchanged;
        }
        let notify = self.should_notify_open(policy, now);
        self.opened_at = now;
        self.is_open = true;
        Opening::Opened { notify }
    }

    /// Run on recheck. `closed_at` is back-dated by the window to the
    /// approximate moment the pings stopped. Returns whether the pub closed.
    pub fn close_if_stale(
        &mut self,
        policy: &PubPolicy,
        now: DateTime<Utc>,
        last_ok: DateTime<Utc>,
    ) -> bool {
        if !self.is_open || is_ok(policy, now, last_ok) {
            return false;
        }
        self.is_open = false;
        self.closed_at = now - policy.liveness_window;
        true
    }
}
