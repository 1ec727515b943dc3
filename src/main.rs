//! POS loyalty sync CLI
//!
//! Replays checkout scenarios against a coupon snapshot and prints the
//! reconciled coupon cache.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- coupons.csv scenario.json > coupons_after.csv
//! cargo run -- --loader sync coupons.csv scenario.json > coupons_after.csv
//! cargo run -- --loader async --batch-size 2000 --rpc-timeout-ms 500 coupons.csv scenario.json
//! RUST_LOG=pos_loyalty_sync=debug cargo run -- coupons.csv scenario.json
//! ```
//!
//! The coupon CSV goes to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, unreadable snapshot or scenario, etc.)

use pos_loyalty_sync::cli::{self, CliArgs};
use pos_loyalty_sync::io::write_coupons_csv;
use pos_loyalty_sync::loader::create_loader;
use pos_loyalty_sync::replay::{run_scenario, Scenario};
use pos_loyalty_sync::LoyaltyError;
use std::process;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    if let Err(e) = run(args).await {
        error!(error = %e, "Replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<(), LoyaltyError> {
    let config = args.to_sync_config();

    let loader = create_loader(args.loader, &config);
    let coupons = loader.load(&args.coupons_file).await?;
    let scenario = Scenario::from_file(&args.scenario_file).await?;

    let (session, summary) = run_scenario(coupons, scenario, config).await?;
    info!(
        steps = summary.steps.len(),
        rpc_calls = summary.calls.len(),
        "Replay finished"
    );

    let mut output = std::io::stdout();
    write_coupons_csv(&session.coupons.get_all_coupons(), &mut output)
}
