#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `keg` command line: wiring, HTTP surface and subcommands.

pub mod app;
pub mod cli;
pub mod error_fmt;
pub mod http;
pub mod logging;
pub mod notifications;
pub mod replay;
pub mod serve;
pub mod status;
