//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `maillog_sentinel` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use maillog_sentinel::initialization::init_logger_with;
use maillog_sentinel::{run_extraction, run_lookup, run_update, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    if let Some(ip) = config.lookup.clone() {
        return run_lookup(&config, &ip);
    }

    if config.update {
        if !run_update(&config).await {
            eprintln!("maillog_sentinel: database update failed, see log for details");
            process::exit(1);
        }
        println!("Geolocation databases updated");
        return Ok(());
    }

    match run_extraction(config).await {
        Ok(report) => {
            println!(
                "Extracted {} event{} from {} line{} in {:.1}s (resume position {})",
                report.events_extracted,
                if report.events_extracted == 1 { "" } else { "s" },
                report.lines_read,
                if report.lines_read == 1 { "" } else { "s" },
                report.elapsed_seconds,
                report.position
            );
            println!("Results appended to {}", report.csv_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("maillog_sentinel error: {:#}", e);
            process::exit(1);
        }
    }
}
