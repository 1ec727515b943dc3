use crate::config::SyncConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay checkout scenarios against a coupon snapshot
#[derive(Parser, Debug)]
#[command(name = "pos-loyalty-sync")]
#[command(
    about = "Replay checkout scenarios against a coupon snapshot and print the reconciled coupons",
    long_about = None
)]
pub struct CliArgs {
    /// Coupon snapshot CSV (id,code,program_id,partner_id,balance)
    #[arg(value_name = "COUPONS", help = "Path to the coupon snapshot CSV file")]
    pub coupons_file: PathBuf,

    /// Scenario JSON with programs, rewards and the orders to validate
    #[arg(value_name = "SCENARIO", help = "Path to the scenario JSON file")]
    pub scenario_file: PathBuf,

    /// Strategy used to read the coupon snapshot
    #[arg(
        long = "loader",
        value_name = "LOADER",
        default_value = "async",
        help = "Snapshot loader: 'sync' for the blocking reader or 'async' for batched reading"
    )]
    pub loader: LoaderType,

    /// Timeout of every server call, in milliseconds
    #[arg(
        long = "rpc-timeout-ms",
        value_name = "MILLIS",
        help = "Timeout of every server call in milliseconds (default: 10000)"
    )]
    pub rpc_timeout_ms: Option<u64>,

    /// Rows per batch (async loader only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of snapshot rows read per batch (default: 500)"
    )]
    pub batch_size: Option<usize>,
}

/// Available snapshot loaders
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LoaderType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a SyncConfig from CLI arguments
    ///
    /// Missing values take the defaults; zero values fall back to the defaults
    /// with a warning.
    pub fn to_sync_config(&self) -> SyncConfig {
        if self.rpc_timeout_ms.is_none() && self.batch_size.is_none() {
            return SyncConfig::default();
        }

        let default = SyncConfig::default();
        SyncConfig::new(
            self.rpc_timeout_ms.unwrap_or(default.rpc_timeout_ms()),
            self.batch_size.unwrap_or(default.batch_size),
        )
    }
}
