//! Typed facade over the string key-value store.
//!
//! Each engine field lives under its own key. Reads distinguish "never
//! written" (`Ok(None)`) from store or decode failures so the loader can keep
//! the zero value and log at the right level.

use crate::error::{KegError, Result};
use crate::store_error::map_store_error;
use crate::warehouse::Warehouse;
use chrono::{DateTime, SecondsFormat, Utc};
use eyre::Report;
use keg_traits::KvStore;
use std::str::FromStr;
use std::sync::Arc;

pub mod keys {
    pub const WEIGHT: &str = "weight";
    pub const WEIGHT_AT: &str = "weight_at";
    pub const ACTIVE_KEG: &str = "active_keg";
    pub const ACTIVE_KEG_AT: &str = "active_keg_at";
    pub const BEERS_LEFT: &str = "beers_left";
    pub const BEERS_TOTAL: &str = "beers_total";
    pub const IS_LOW: &str = "is_low";
    pub const WAREHOUSE: &str = "warehouse";
    pub const LAST_OK: &str = "last_ok";
    pub const OPEN_AT: &str = "open_at";
    pub const CLOSE_AT: &str = "close_at";
    pub const IS_OPEN: &str = "is_open";
}

#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

fn store_err(e: keg_traits::BoxError) -> Report {
    Report::new(map_store_error(e.as_ref()))
}

fn decode_err(key: &str, raw: &str, why: impl std::fmt::Display) -> Report {
    Report::new(KegError::State(format!("bad value {raw:?} for {key}: {why}")))
}

impl Persistence {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key).map_err(store_err)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).map_err(store_err)
    }

    fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| decode_err(key, &raw, e)),
        }
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.get_parsed(key)
    }

    pub fn set_f64(&self, key: &str, value: f64) -> Result<()> {
        self.set_raw(key, &value.to_string())
    }

    pub fn get_i32(&self, key: &str) -> Result<Option<i32>> {
        self.get_parsed(key)
    }

    pub fn set_i32(&self, key: &str, value: i32) -> Result<()> {
        self.set_raw(key, &value.to_string())
    }

    /// Booleans are stored as `"true"`/`"false"`; `"1"`/`"0"` are accepted on read.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(raw) => match raw.trim() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(decode_err(key, &raw, "expected a boolean")),
            },
        }
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_raw(key, if value { "true" } else { "false" })
    }

    pub fn get_time(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| decode_err(key, &raw, e)),
        }
    }

    pub fn set_time(&self, key: &str, value: DateTime<Utc>) -> Result<()> {
        self.set_raw(key, &value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn get_warehouse(&self) -> Result<Option<Warehouse>> {
        match self.get_raw(keys::WAREHOUSE)? {
            None => Ok(None),
            Some(raw) => Warehouse::decode(&raw).map(Some).map_err(Report::new),
        }
    }

    pub fn set_warehouse(&self, warehouse: &Warehouse) -> Result<()> {
        self.set_raw(keys::WAREHOUSE, &warehouse.encode())
    }

    pub fn events(&self) -> Result<Vec<String>> {
        self.store.events().map_err(store_err)
    }
}
