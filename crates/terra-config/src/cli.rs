//! Command-line argument parsing shared by the Terra binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, ProviderSource};

/// Terra command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Terra planet viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Server bind address.
    #[arg(long)]
    pub host: Option<String>,

    /// Server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Planet data provider.
    #[arg(long, value_enum)]
    pub source: Option<ProviderSource>,

    /// Planet API base URL used by the viewer.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Planet requested by the viewer.
    #[arg(long)]
    pub planet: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(source) = args.source {
            self.upstream.source = source;
        }
        if let Some(ref url) = args.api_url {
            self.scene.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref planet) = args.planet {
            self.scene.planet_name = planet.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
