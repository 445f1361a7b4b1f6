//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration shared by the planet server and the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Viewer window settings.
    pub window: WindowConfig,
    /// Planet API server settings.
    pub server: ServerConfig,
    /// Planet data provider settings.
    pub upstream: UpstreamConfig,
    /// Earth scene settings.
    pub scene: SceneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title shown before the planet record arrives.
    pub title: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to.
    pub host: String,
    /// Port the server binds to (0 = OS assigned).
    pub port: u16,
    /// Directory served under `/textures`.
    pub public_dir: PathBuf,
}

/// Which planet data provider backs the endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderSource {
    /// Always answers with the hardcoded Earth record.
    #[default]
    Static,
    /// Forwards lookups to the third-party planets API.
    Upstream,
}

/// Planet data provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Provider backing `/api/planets`.
    pub source: ProviderSource,
    /// Base URL of the upstream planets API.
    pub base_url: String,
    /// API key. Left empty, the key is read from `api_key_env` at startup.
    pub api_key: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

/// Texture files requested for the planet material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TextureSet {
    /// Day colour map with optional specular and normal maps.
    Detailed {
        day: String,
        specular: Option<String>,
        normal: Option<String>,
    },
    /// A single land colour texture.
    Legacy { land: String },
}

/// Earth scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Planet requested from the API on startup.
    pub planet_name: String,
    /// Base URL of the planet API used by the viewer.
    pub api_base_url: String,
    /// Where textures are loaded from: an `http(s)://` URL or a directory.
    pub texture_root: String,
    /// Texture files, relative to `texture_root`.
    pub textures: TextureSet,
    /// Time after which the loading indicator is dropped even if textures are pending.
    pub texture_timeout_ms: u64,
    /// Seed for the starfield layers.
    pub star_seed: u64,
    /// Add the rim and fill point lights.
    pub fill_lights: bool,
    /// Enable drag-to-rotate / scroll-to-zoom camera controls.
    pub orbit_controls: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Terra".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            source: ProviderSource::Static,
            base_url: "https://api.api-ninjas.com/v1/planets".to_string(),
            api_key: String::new(),
            api_key_env: "API_NINJAS_KEY".to_string(),
        }
    }
}

impl Default for TextureSet {
    fn default() -> Self {
        Self::Detailed {
            day: "earth_daymap.jpg".to_string(),
            specular: Some("earth_specular.jpg".to_string()),
            normal: Some("earth_normal.jpg".to_string()),
        }
    }
}

impl TextureSet {
    /// The single-texture layout used before the detailed maps existed.
    pub fn legacy() -> Self {
        Self::Legacy {
            land: "earth_texture.jpg".to_string(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            planet_name: "Earth".to_string(),
            api_base_url: "http://127.0.0.1:3000".to_string(),
            texture_root: "http://127.0.0.1:3000/textures/earth".to_string(),
            textures: TextureSet::default(),
            texture_timeout_ms: 1500,
            star_seed: 42,
            fill_lights: true,
            orbit_controls: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl UpstreamConfig {
    /// The configured API key, falling back to the environment variable.
    ///
    /// Returns `None` when neither source yields a non-empty key.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Reject values that parse but cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window",
                reason: format!("{}x{} has a zero dimension", self.window.width, self.window.height),
            });
        }
        if !self.scene.api_base_url.starts_with("http://")
            && !self.scene.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "scene.api_base_url",
                reason: format!("'{}' is not an http(s) URL", self.scene.api_base_url),
            });
        }
        if self.scene.texture_root.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scene.texture_root",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
