//! Terra planet data service.
//!
//! Run with: `cargo run -p terra-server -- --source upstream`

use clap::Parser;
use terra_config::{CliArgs, Config};
use terra_planets::{PlanetQuery, build_provider};
use terra_server::PlanetServer;
use terra_server::routes::Routes;
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();
    let config_dir = terra_config::config_dir(args.config.as_deref());

    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_dir.display());
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    terra_log::init_logging(
        config.debug.log_dir.as_deref(),
        "terra-server.log",
        cfg!(debug_assertions),
        Some(&config),
    );

    info!(
        "Provider: {:?} | Public dir: {}",
        config.upstream.source,
        config.server.public_dir.display()
    );

    // A provider that fails to build still starts the server; queries answer 500.
    let query = PlanetQuery::new(build_provider(&config.upstream));
    let routes = Routes::new(query, config.server.public_dir.clone());

    let mut server = PlanetServer::new(config.server.host.clone(), config.server.port);
    if let Err(e) = server.start(routes) {
        error!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = server.wait() {
        error!("{e}");
        std::process::exit(1);
    }
}
