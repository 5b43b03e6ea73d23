#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Keg scale reconciliation (storage-agnostic).
//!
//! Turns raw weight telemetry from a keg scale into business facts: beers
//! left in the tapped keg, keg swaps, warehouse stock and whether the pub is
//! open. All storage, metrics and notification go through the seams in
//! `keg_traits`.
//!
//! ## Architecture
//!
//! - **KegModel**: weight ↔ keg size ↔ beer count (`keg` module)
//! - **Warehouse**: five-slot stock ledger (`warehouse` module)
//! - **Events**: transition events and their dispatcher thread (`events`)
//! - **Pub state**: liveness-based open/closed detection (`pub_state`)
//! - **Engine**: the locked aggregate tying it together (`engine`, `builder`)
//! - **Recheck**: periodic close detection (`recheck`)
//!
//! ## Units
//!
//! Weights are grams (`f64`), keg sizes liters (`i32`), timestamps UTC.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod events;
pub mod keg;
pub mod message;
pub mod mocks;
pub mod output;
pub mod persist;
pub mod pub_state;
pub mod recheck;
pub mod store_error;
pub mod util;
pub mod warehouse;

pub use builder::ScaleEngineBuilder;
pub use config::{EngineSettings, PubPolicy};
pub use engine::{ScaleEngine, ScaleState};
pub use error::{BuildError, KegError, Report, Result};
pub use events::{Event, EventBus, EventKind, Hook};
pub use message::{MessageKind, ScaleMessage};
pub use output::{OpeningOutput, PubOutput, ScaleOutput};
pub use recheck::Rechecker;
pub use warehouse::{Warehouse, WarehouseItem};
