//! Planet data providers.

use std::fmt;
use std::sync::Arc;

use terra_config::{ProviderSource, UpstreamConfig};

use crate::record::PlanetRecord;

/// Errors raised while building or querying a provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not configured. Please set {env_var}")]
    ConfigurationMissing { env_var: String },
    #[error("Upstream request failed: {0}")]
    Transport(String),
    #[error("Invalid upstream response: {0}")]
    Decode(String),
}

/// Source of planet records by name.
///
/// A name with no matches yields `Ok(vec![])`, never an error.
pub trait PlanetProvider: Send + Sync {
    fn fetch(&self, name: &str) -> Result<Vec<PlanetRecord>, ProviderError>;
}

/// Answers every lookup with the hardcoded Earth record.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticProvider;

impl PlanetProvider for StaticProvider {
    fn fetch(&self, name: &str) -> Result<Vec<PlanetRecord>, ProviderError> {
        tracing::debug!(name, "Returning hardcoded planet data");
        Ok(vec![PlanetRecord::earth()])
    }
}

/// Upstream API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// `None` for an empty or whitespace-only key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

/// Everything the upstream provider needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub api_key: Option<ApiKey>,
    /// Name of the variable the key should come from, for error messages.
    pub api_key_env: String,
}

impl UpstreamSettings {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.resolve_api_key().and_then(ApiKey::new),
            api_key_env: config.api_key_env.clone(),
        }
    }
}

/// Looks planets up in the API Ninjas `v1/planets` service.
pub struct UpstreamProvider {
    agent: ureq::Agent,
    base_url: String,
    api_key: ApiKey,
}

impl UpstreamProvider {
    /// Fails with [`ProviderError::ConfigurationMissing`] when no key is set.
    pub fn new(settings: UpstreamSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .api_key
            .ok_or(ProviderError::ConfigurationMissing {
                env_var: settings.api_key_env,
            })?;
        Ok(Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: settings.base_url,
            api_key,
        })
    }
}

impl PlanetProvider for UpstreamProvider {
    fn fetch(&self, name: &str) -> Result<Vec<PlanetRecord>, ProviderError> {
        let response = match self
            .agent
            .get(&self.base_url)
            .query("name", name)
            .set("X-Api-Key", self.api_key.expose())
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                tracing::error!(name, status, "Upstream planet API returned an error status");
                return Ok(Vec::new());
            }
            Err(ureq::Error::Transport(e)) => {
                return Err(ProviderError::Transport(e.to_string()));
            }
        };

        response
            .into_json::<Vec<PlanetRecord>>()
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

impl fmt::Debug for UpstreamProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Build the one provider the process serves from.
///
/// The error is kept by the caller rather than aborting: an unconfigured
/// upstream makes the endpoint answer 500 instead of refusing to start.
pub fn build_provider(config: &UpstreamConfig) -> Result<Arc<dyn PlanetProvider>, ProviderError> {
    match config.source {
        ProviderSource::Static => Ok(Arc::new(StaticProvider)),
        ProviderSource::Upstream => {
            let provider = UpstreamProvider::new(UpstreamSettings::from_config(config))?;
            Ok(Arc::new(provider))
        }
    }
}
