use std::{path::PathBuf, process::ExitCode};

use async_std::task;
use clap::Parser;
use pf_log::log_full_error;
use tracing::info;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[clap(author, version, about)]
struct Args {
    #[clap(
        short,
        long,
        value_parser,
        default_value = "config.yaml",
        help = "Path of the configuration file. It is created when missing."
    )]
    config: PathBuf,
    #[clap(
        short,
        long,
        value_parser,
        default_value = "logs",
        help = "Directory to store log files in."
    )]
    log_dir: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = std::fs::create_dir_all(args.log_dir.as_path()) {
        eprintln!("Failed to create log directory: {err}");
        return ExitCode::FAILURE;
    }
    // The guard flushes the log file on drop.
    let _guard = match pf_log::init(args.log_dir.as_path()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to initialize logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Starting pathfinder {{ \"Version\": \"{}\" }}",
        CARGO_PKG_VERSION
    );

    let config = async_std::path::PathBuf::from(args.config);
    let result = task::block_on(async {
        let conf = pf_conf::load_conf(config.as_path()).await;
        pf_service::run(conf).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_full_error!(err.as_ref());
            ExitCode::FAILURE
        }
    }
}
