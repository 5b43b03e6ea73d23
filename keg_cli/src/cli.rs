//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config path tried when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "etc/keg.toml";

#[derive(Parser, Debug)]
#[command(name = "keg", version, about = "Keg scale reconciliation")]
pub struct Cli {
    /// Path to config TOML; built-in defaults apply when omitted and etc/keg.toml is absent
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and print results as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to logging.level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP ingestion and status API with the recheck ticker
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Feed a CSV trace of weights through a fresh in-memory engine
    Replay {
        /// CSV with headers `offset_s,weight`; an empty weight is a ping only
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        /// Active keg to start from (0 = none)
        #[arg(long, value_name = "LITERS", default_value_t = 0)]
        keg: i32,
    },
    /// Print the persisted scale snapshot and event log
    Status,
}
