//! The scale reconciliation engine.
//!
//! `ScaleEngine` owns the single mutable [`ScaleState`] behind one `RwLock`.
//! Every mutating operation holds the write lock for its whole duration,
//! store calls included, and flushes each changed field to the store as it
//! goes. Events produced while locked are queued on the [`EventBus`] only
//! after the lock is released.
//!
//! Persistence failures are returned from the operation that triggered them
//! after the in-memory state has already changed; nothing is rolled back.

use crate::config::EngineSettings;
use crate::error::{KegError, Result};
use crate::events::{Event, EventBus, EventKind, Hook};
use crate::keg;
use crate::output::{OpeningOutput, PubOutput, ScaleOutput};
use crate::persist::{Persistence, keys};
use crate::pub_state::{self, Opening, PubState};
use crate::util::{format_date, format_elapsed, format_push_response};
use crate::warehouse::Warehouse;
use chrono::{DateTime, Utc};
use eyre::Report;
use keg_traits::{BoxError, Clock, Metrics};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Everything the engine knows about the scale, the tapped keg and the pub.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleState {
    pub weight: f64,
    pub weight_at: DateTime<Utc>,
    /// Size seen once and awaiting confirmation; 0 = none.
    pub candidate_keg: i32,
    /// Tapped keg in liters; 0 = none.
    pub active_keg: i32,
    pub active_keg_at: DateTime<Utc>,
    pub beers_left: i32,
    /// Lifetime counter of beers from finished kegs.
    pub beers_total: i32,
    pub is_low: bool,
    pub warehouse: Warehouse,
    pub pub_state: PubState,
    pub last_ok: DateTime<Utc>,
    pub rssi: f64,
}

impl Default for ScaleState {
    fn default() -> Self {
        Self {
            weight: 0.0,
            weight_at: DateTime::<Utc>::UNIX_EPOCH,
            candidate_keg: 0,
            active_keg: 0,
            active_keg_at: DateTime::<Utc>::UNIX_EPOCH,
            beers_left: 0,
            beers_total: 0,
            is_low: false,
            warehouse: Warehouse::default(),
            pub_state: PubState::default(),
            last_ok: DateTime::<Utc>::UNIX_EPOCH,
            rssi: 0.0,
        }
    }
}

pub struct ScaleEngine {
    state: RwLock<ScaleState>,
    persist: Persistence,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn Metrics>,
    settings: EngineSettings,
}

impl std::fmt::Debug for ScaleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaleEngine")
            .field("state", &*self.read())
            .field("bus", &self.bus)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// Loaded field value, or the zero value when missing or unreadable.
fn loaded<T>(key: &str, value: Result<Option<T>>) -> Option<T> {
    match value {
        Ok(Some(v)) => Some(v),
        Ok(None) => {
            tracing::debug!(key, "no stored value, keeping default");
            None
        }
        Err(e) => {
            tracing::debug!(key, error = %e, "could not load stored value, keeping default");
            None
        }
    }
}

impl ScaleEngine {
    pub(crate) fn from_parts(
        persist: Persistence,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn Metrics>,
        settings: EngineSettings,
    ) -> Self {
        let state = Self::load(&persist);
        metrics.set_weight(state.weight);
        metrics.set_active_keg(state.active_keg);
        metrics.set_beers_left(state.beers_left);
        metrics.set_pub_open(state.pub_state.is_open);

        let bus = EventBus::spawn(persist.store().clone(), settings.event_log_cap);
        Self {
            state: RwLock::new(state),
            persist,
            bus,
            clock,
            metrics,
            settings,
        }
    }

    fn load(p: &Persistence) -> ScaleState {
        let mut st = ScaleState::default();
        if let Some(v) = loaded(keys::WEIGHT, p.get_f64(keys::WEIGHT)) {
            st.weight = v;
        }
        if let Some(v) = loaded(keys::WEIGHT_AT, p.get_time(keys::WEIGHT_AT)) {
            st.weight_at = v;
        }
        if let Some(v) = loaded(keys::ACTIVE_KEG, p.get_i32(keys::ACTIVE_KEG)) {
            st.active_keg = v;
        }
        if let Some(v) = loaded(keys::ACTIVE_KEG_AT, p.get_time(keys::ACTIVE_KEG_AT)) {
            st.active_keg_at = v;
        }
        if let Some(v) = loaded(keys::BEERS_LEFT, p.get_i32(keys::BEERS_LEFT)) {
            st.beers_left = v;
        }
        if let Some(v) = loaded(keys::BEERS_TOTAL, p.get_i32(keys::BEERS_TOTAL)) {
            st.beers_total = v;
        }
        if let Some(v) = loaded(keys::IS_LOW, p.get_bool(keys::IS_LOW)) {
            st.is_low = v;
        }
        match p.get_warehouse() {
            Ok(Some(w)) => st.warehouse = w,
            Ok(None) => tracing::debug!("no stored warehouse, starting empty"),
            Err(e) => tracing::warn!(error = %e, "stored warehouse is malformed, resetting to zero"),
        }
        if let Some(v) = loaded(keys::LAST_OK, p.get_time(keys::LAST_OK)) {
            st.last_ok = v;
        }
        if let Some(v) = loaded(keys::IS_OPEN, p.get_bool(keys::IS_OPEN)) {
            st.pub_state.is_open = v;
        }
        if let Some(v) = loaded(keys::OPEN_AT, p.get_time(keys::OPEN_AT)) {
            st.pub_state.opened_at = v;
        }
        if let Some(v) = loaded(keys::CLOSE_AT, p.get_time(keys::CLOSE_AT)) {
            st.pub_state.closed_at = v;
        }
        st
    }

    fn read(&self) -> RwLockReadGuard<'_, ScaleState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ScaleState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, events: Vec<Event>) {
        for event in events {
            self.bus.dispatch(event);
        }
    }

    fn event(kind: EventKind, at: DateTime<Utc>, st: &ScaleState) -> Event {
        Event {
            kind,
            at,
            active_keg: st.active_keg,
            beers_left: st.beers_left,
            warehouse_beers: st.warehouse.total_beers(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Consistent copy of the current state.
    pub fn snapshot(&self) -> ScaleState {
        self.read().clone()
    }

    // ── Hooks ────────────────────────────────────────────────────────────────

    pub fn register_hook(&self, kind: EventKind, hook: Arc<dyn Hook>) {
        self.bus.register(kind, hook);
    }

    pub fn on_event<F>(&self, kind: EventKind, f: F)
    where
        F: Fn(&Event) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.bus.on(kind, f);
    }

    // ── Measurements ─────────────────────────────────────────────────────────

    /// Feed one weight reading in grams.
    ///
    /// Readings outside the configured range are dropped and return `Ok`.
    pub fn add_measurement(&self, weight: f64) -> Result<()> {
        let (min, max) = (self.settings.min_weight_g, self.settings.max_weight_g);
        if !(min..=max).contains(&weight) {
            tracing::info!(weight, "invalid weight, measurement dropped");
            return Ok(());
        }

        let mut events = Vec::new();
        let res = {
            let mut guard = self.write();
            self.measure_locked(&mut guard, weight, &mut events)
        };
        self.flush(events);
        res
    }

    fn measure_locked(
        &self,
        st: &mut ScaleState,
        weight: f64,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let now = self.clock.now();
        // Keg on tap before this reading; an empty roll below clears it.
        let prev_keg = st.active_keg;
        st.weight = weight;
        st.weight_at = now;
        self.persist.set_f64(keys::WEIGHT, weight)?;
        self.persist.set_time(keys::WEIGHT_AT, now)?;

        st.beers_left = keg::beers_left(st.active_keg, weight);
        self.persist.set_i32(keys::BEERS_LEFT, st.beers_left)?;

        if st.beers_left == 0 && st.active_keg != 0 {
            tracing::info!(keg = st.active_keg, weight, "keg is empty");
            self.roll_into_total(st)?;
        }

        if !st.is_low && keg::is_low(st.active_keg, weight) {
            st.is_low = true;
            self.persist.set_bool(keys::IS_LOW, true)?;
        }

        if st.active_keg == 0 || st.is_low {
            self.try_new_keg(st, prev_keg, weight, now, events)?;
        }

        self.metrics.set_weight(st.weight);
        self.metrics.set_beers_left(st.beers_left);
        self.metrics.set_active_keg(st.active_keg);
        Ok(())
    }

    /// Two consecutive readings must agree on the size before a keg is tapped.
    fn try_new_keg(
        &self,
        st: &mut ScaleState,
        prev_keg: i32,
        weight: f64,
        now: DateTime<Utc>,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let Some(guess) = keg::guess_keg_size(weight, self.settings.guess_tolerance_g) else {
            return Ok(());
        };

        if guess != st.candidate_keg {
            tracing::info!(keg = guess, weight, "new keg candidate registered");
            st.candidate_keg = guess;
            return Ok(());
        }

        st.candidate_keg = 0;
        // A nearly empty 50 l keg weighs about as much as a full 10 l one.
        if prev_keg == 50 && guess == 10 {
            tracing::warn!(weight, "10 l guess ignored while a low 50 l keg is tapped");
            return Ok(());
        }

        if st.active_keg != 0 {
            self.roll_into_total(st)?;
        }

        st.active_keg = guess;
        st.active_keg_at = now;
        st.beers_left = keg::beers_left(guess, weight);
        st.is_low = false;
        self.persist.set_i32(keys::ACTIVE_KEG, guess)?;
        self.persist.set_time(keys::ACTIVE_KEG_AT, now)?;
        self.persist.set_i32(keys::BEERS_LEFT, st.beers_left)?;
        self.persist.set_bool(keys::IS_LOW, false)?;

        if st.warehouse.decrease(guess).map_err(Report::new)? {
            self.persist.set_warehouse(&st.warehouse)?;
        } else {
            tracing::warn!(keg = guess, "tapped keg is not available in the warehouse");
        }

        tracing::info!(keg = guess, weight, "new keg confirmed");
        events.push(Self::event(EventKind::NewKegTapped, now, st));
        Ok(())
    }

    /// Count the full capacity of the tapped keg as consumed and untap it.
    pub fn add_current_keg_to_total(&self) -> Result<()> {
        let mut guard = self.write();
        self.roll_into_total(&mut guard)
    }

    fn roll_into_total(&self, st: &mut ScaleState) -> Result<()> {
        let beers = keg::capacity(st.active_keg);
        st.beers_total = st.beers_total.saturating_add(beers);
        st.active_keg = 0;
        st.beers_left = 0;
        self.metrics.add_beers_total(beers);
        self.persist.set_i32(keys::BEERS_TOTAL, st.beers_total)?;
        self.persist.set_i32(keys::ACTIVE_KEG, 0)?;
        self.persist.set_i32(keys::BEERS_LEFT, 0)
    }

    // ── Liveness ─────────────────────────────────────────────────────────────

    /// Record a sign of life from the scale; opens the pub if it was closed.
    pub fn ping(&self) {
        let now = self.clock.now();
        self.metrics.set_last_ping(now.timestamp());

        let mut events = Vec::new();
        {
            let mut guard = self.write();
            let st = &mut *guard;
            st.last_ok = now;
            if let Err(e) = self.persist.set_time(keys::LAST_OK, now) {
                tracing::warn!(error = %e, "could not store last_ok");
            }
            self.open_locked(st, now, &mut events);
        }
        self.flush(events);
    }

    fn open_locked(&self, st: &mut ScaleState, now: DateTime<Utc>, events: &mut Vec<Event>) {
        let Opening::Opened { notify } = st.pub_state.open(&self.settings.pub_policy, now) else {
            return;
        };
        tracing::info!(notify, "pub opened");
        self.metrics.set_pub_open(true);
        if let Err(e) = self.persist.set_bool(keys::IS_OPEN, true) {
            tracing::warn!(error = %e, "could not store is_open");
        }
        if let Err(e) = self.persist.set_time(keys::OPEN_AT, st.pub_state.opened_at) {
            tracing::warn!(error = %e, "could not store open_at");
        }
        if notify {
            events.push(Self::event(EventKind::PubOpened, now, st));
        }
    }

    /// Close the pub when the scale has been silent for the liveness window.
    pub fn recheck(&self) {
        let now = self.clock.now();
        let mut events = Vec::new();
        {
            let mut guard = self.write();
            let st = &mut *guard;
            if st
                .pub_state
                .close_if_stale(&self.settings.pub_policy, now, st.last_ok)
            {
                tracing::info!(last_ok = %st.last_ok, "pub closed");
                self.metrics.set_pub_open(false);
                if let Err(e) = self.persist.set_bool(keys::IS_OPEN, false) {
                    tracing::warn!(error = %e, "could not store is_open");
                }
                if let Err(e) = self.persist.set_time(keys::CLOSE_AT, st.pub_state.closed_at) {
                    tracing::warn!(error = %e, "could not store close_at");
                }
                events.push(Self::event(EventKind::PubClosed, now, st));
            }
        }
        self.flush(events);
    }

    pub fn set_rssi(&self, rssi: f64) {
        self.metrics.set_rssi(rssi);
        self.write().rssi = rssi;
    }

    // ── Admin overrides ──────────────────────────────────────────────────────

    /// Force the tapped keg; 0 untaps it.
    pub fn set_active_keg(&self, keg: i32) -> Result<()> {
        if keg != 0 && !keg::is_known(keg) {
            return Err(Report::new(KegError::UnknownKeg(keg)));
        }

        let now = self.clock.now();
        let mut guard = self.write();
        let st = &mut *guard;
        st.candidate_keg = 0;

        if keg == 0 {
            if st.active_keg != 0 {
                self.roll_into_total(st)?;
            }
            st.is_low = true;
            st.beers_left = 0;
        } else {
            st.active_keg = keg;
            st.active_keg_at = now;
            st.is_low = false;
            st.beers_left = keg::beers_left(keg, st.weight);
        }
        self.metrics.set_active_keg(st.active_keg);
        self.metrics.set_beers_left(st.beers_left);

        self.persist.set_i32(keys::ACTIVE_KEG, st.active_keg)?;
        if keg != 0 {
            self.persist.set_time(keys::ACTIVE_KEG_AT, now)?;
        }
        self.persist.set_i32(keys::BEERS_LEFT, st.beers_left)?;
        self.persist.set_bool(keys::IS_LOW, st.is_low)
    }

    pub fn increase_warehouse(&self, keg: i32) -> Result<()> {
        let mut guard = self.write();
        guard.warehouse.increase(keg).map_err(Report::new)?;
        self.persist.set_warehouse(&guard.warehouse)
    }

    /// Remove one keg from stock; an empty slot is left alone.
    pub fn decrease_warehouse(&self, keg: i32) -> Result<()> {
        let mut guard = self.write();
        if guard.warehouse.decrease(keg).map_err(Report::new)? {
            self.persist.set_warehouse(&guard.warehouse)?;
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get_scale(&self) -> ScaleOutput {
        let now = self.clock.now();
        let st = self.read();
        ScaleOutput {
            is_ok: pub_state::is_ok(&self.settings.pub_policy, now, st.last_ok),
            beers_left: st.beers_left,
            beers_total: st.beers_total,
            last_weight: st.weight,
            last_weight_formatted: format!("{:.2}", st.weight / 1000.0),
            last_at: format_date(st.weight_at),
            last_at_duration: format_elapsed(now.signed_duration_since(st.weight_at)),
            rssi: st.rssi,
            last_update: format_date(st.last_ok),
            last_update_duration: format_elapsed(now.signed_duration_since(st.last_ok)),
            pub_state: PubOutput {
                is_open: st.pub_state.is_open,
                opened_at: format_date(st.pub_state.opened_at),
                closed_at: format_date(st.pub_state.closed_at),
            },
            active_keg: st.active_keg,
            active_keg_at: st.active_keg_at,
            is_low: st.is_low,
            warehouse: st.warehouse.items(),
            warehouse_beer_left: st.warehouse.total_beers(),
        }
    }

    /// Text for the scale's four-digit display.
    pub fn get_push_response(&self) -> String {
        format_push_response(self.read().beers_left)
    }

    pub fn get_opening(&self) -> OpeningOutput {
        let st = self.read();
        OpeningOutput {
            is_open: st.pub_state.is_open,
            open_at: st.pub_state.opened_at,
            closed_at: st.pub_state.closed_at,
        }
    }

    /// Durable event log, oldest first.
    pub fn events(&self) -> Result<Vec<String>> {
        self.persist.events()
    }

    /// Wait for queued events to reach the log and the hooks.
    pub fn wait_for_events(&self, timeout: std::time::Duration) -> bool {
        self.bus.wait_idle(timeout)
    }
}
