mod bootstrap;
mod config;

use std::env;
use std::ffi::OsString;
use std::process;

use config::BootstrapConfig;
use tracing::metadata::LevelFilter;

fn setup_logging() {
    let filter = std::env::var("ENTRYPOINT_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::INFO);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    setup_logging();

    let config = BootstrapConfig::from_env();
    if let Err(error) = bootstrap::run(&config) {
        tracing::error!("Bootstrap failed: {error:#}");
        process::exit(1);
    }

    let command: Vec<OsString> = env::args_os().skip(1).collect();
    let error = bootstrap::exec_command(&command);
    tracing::error!("Handoff failed: {error:#}");
    process::exit(1);
}
