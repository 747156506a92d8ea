//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `ip_warehouse` library that handles:
//! - Command-line argument parsing and the JSON config file
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Pid file ownership and control signals
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use ip_warehouse::initialization::init_logger_with;
use ip_warehouse::{run_collection, send_control_signal, Opt, Supervisor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists), so RUST_LOG
    // can live there. Try the current directory first, then next to the
    // executable.
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    // `-s reload|stop`: signal the running instance and exit
    if let Some(signal) = opt.signal {
        let pid_file = opt.control_pid_file().context("Failed to load configuration")?;
        return match send_control_signal(&pid_file, signal) {
            Ok(pid) => {
                println!("Sent {:?} to ip_warehouse (pid {})", signal, pid);
                Ok(())
            }
            Err(e) => {
                eprintln!("ip_warehouse error: {:#}", anyhow::Error::from(e));
                process::exit(1);
            }
        };
    }

    let config = match opt.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ip_warehouse error: {:#}", anyhow::Error::from(e));
            process::exit(1);
        }
    };

    init_logger_with(
        config.log_level.clone().into(),
        config.log_format.clone(),
        config.log_file.as_deref(),
    )
    .context("Failed to initialize logger")?;

    let supervisor = match Supervisor::start(&config.pid_file) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            eprintln!("ip_warehouse error: {:#}", anyhow::Error::from(e));
            process::exit(1);
        }
    };

    let result = run_collection(config, supervisor.cancel_token()).await;
    supervisor.shutdown().await;

    match result {
        Ok(report) => {
            println!(
                "Resolved {} segment{} into {} ranges ({} abandoned addresses, {} storage failures, {} malformed lines) in {:.1}s{}",
                report.segments,
                if report.segments == 1 { "" } else { "s" },
                report.ranges,
                report.abandoned_points,
                report.storage_failures,
                report.parse_failures,
                report.elapsed_seconds,
                if report.cancelled { " - stopped early" } else { "" }
            );
            println!("Results saved in {}", report.db_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("ip_warehouse error: {:#}", e);
            process::exit(1);
        }
    }
}
