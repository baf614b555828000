//! The binary entry point for the orrery.

#[allow(dead_code)]
mod platform;

use clap::Parser;
use tracing::info;

use orrery_config::{CliArgs, Config};
use platform::PlatformDirs;

fn main() {
    let args = CliArgs::parse();

    // Resolve and create platform directories on startup.
    let dirs = match PlatformDirs::resolve_and_create() {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to initialize platform directories: {e}");
            std::process::exit(1);
        }
    };

    let config_dir = args.config.clone().unwrap_or_else(|| dirs.config_dir.clone());
    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!("Starting orrery (config: {})", config_dir.display());

    orrery_app::window::run_with_config(config);
}
