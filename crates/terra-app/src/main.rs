//! The binary entry point for the Terra viewer.
//!
//! Run with: `cargo run -p terra-app -- --api-url http://127.0.0.1:3000`

use clap::Parser;
use terra_app::platform::PlatformDirs;
use terra_config::{CliArgs, Config};
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();
    let dirs = PlatformDirs::resolve(args.config.as_deref());
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to initialize platform directories: {e}");
        std::process::exit(1);
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Failed to load config from {}: {e}",
                dirs.config_dir.display()
            );
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    let log_dir = config.debug.log_dir.clone().unwrap_or(dirs.log_dir);
    terra_log::init_logging(
        Some(&log_dir),
        "terra.log",
        cfg!(debug_assertions),
        Some(&config),
    );

    info!(
        "Terra viewer | API: {} | Textures: {}",
        config.scene.api_base_url, config.scene.texture_root
    );

    if let Err(e) = terra_app::run(config) {
        error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
