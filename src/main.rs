//! Ledger Engine CLI
//!
//! Runs an account operation script through the ledger engine and prints the
//! final account states as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > accounts.csv
//! cargo run -- --strategy concurrent script.csv > accounts.csv
//! cargo run -- --strategy concurrent --locking pessimistic --lock-timeout-ms 500 script.csv
//! RUST_LOG=debug cargo run -- --strategy concurrent --jitter script.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success (individual rows may still have failed; see the summary log)
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use ledger_engine::{cli, strategy, telemetry};
use std::process;

fn main() {
    telemetry::init();

    let args = cli::parse_args();

    let strategy = strategy::create_strategy(
        args.strategy.clone(),
        args.to_engine_config(),
        args.default_locking(),
    );

    // Report goes to stdout, logs to stderr
    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        tracing::error!(error = %e, "run failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
