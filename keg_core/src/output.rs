//! Read-only snapshots served by the status API.

use crate::warehouse::WarehouseItem;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PubOutput {
    pub is_open: bool,
    pub opened_at: String,
    pub closed_at: String,
}

/// Full scale state as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleOutput {
    pub is_ok: bool,
    pub beers_left: i32,
    pub beers_total: i32,
    pub last_weight: f64,
    /// Kilograms with two decimals
    pub last_weight_formatted: String,
    pub last_at: String,
    pub last_at_duration: String,
    pub rssi: f64,
    pub last_update: String,
    pub last_update_duration: String,
    pub pub_state: PubOutput,
    pub active_keg: i32,
    pub active_keg_at: DateTime<Utc>,
    pub is_low: bool,
    pub warehouse: Vec<WarehouseItem>,
    pub warehouse_beer_left: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpeningOutput {
    pub is_open: bool,
    pub open_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}
