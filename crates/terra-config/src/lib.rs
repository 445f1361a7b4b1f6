//! Configuration system for Terra.
//!
//! Provides runtime-configurable settings that persist to disk as RON files.
//! Supports CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, ProviderSource, SceneConfig, ServerConfig, TextureSet, UpstreamConfig,
    WindowConfig,
};
pub use error::ConfigError;

/// Resolve the directory holding `config.ron`.
///
/// An explicit CLI path wins; otherwise the OS configuration directory is used,
/// falling back to the working directory when the OS exposes none.
pub fn config_dir(explicit: Option<&std::path::Path>) -> std::path::PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    dirs::config_dir()
        .map(|base| base.join("terra"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}
