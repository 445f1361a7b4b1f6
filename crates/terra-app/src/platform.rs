//! OS-specific directories for the viewer.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not create {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

const APP_NAME: &str = "terra";

/// Where the viewer keeps its config and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve the directories without touching the disk.
    ///
    /// An explicit config directory also roots the log directory; otherwise
    /// logs go to the OS data directory, or next to the config when the OS
    /// exposes none.
    pub fn resolve(explicit_config: Option<&Path>) -> Self {
        let config_dir = terra_config::config_dir(explicit_config);
        let log_dir = match explicit_config {
            Some(_) => config_dir.join("logs"),
            None => dirs::data_local_dir()
                .map(|base| base.join(APP_NAME).join("logs"))
                .unwrap_or_else(|| config_dir.join("logs")),
        };
        Self {
            config_dir,
            log_dir,
        }
    }

    /// Create both directories.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        for path in [&self.config_dir, &self.log_dir] {
            std::fs::create_dir_all(path).map_err(|source| PlatformError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
