//! Blocking client for the planet service's `/api/planets` endpoint.

use std::time::Duration;

use serde::Deserialize;
use terra_planets::PlanetRecord;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Only the record list matters to the viewer; `message` and `error` are ignored.
#[derive(Debug, Deserialize)]
struct PlanetsBody {
    #[serde(default)]
    planets: Vec<PlanetRecord>,
}

#[derive(Clone)]
pub struct PlanetClient {
    agent: ureq::Agent,
    base_url: String,
}

impl PlanetClient {
    /// A client for the service at `base_url`, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .build(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the records the service returns for `name`.
    pub fn fetch(&self, name: &str) -> Result<Vec<PlanetRecord>, ClientError> {
        let url = format!("{}/api/planets", self.base_url);
        let response = match self.agent.get(&url).query("name", name).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => return Err(ClientError::Status(status)),
            Err(ureq::Error::Transport(e)) => return Err(ClientError::Transport(e.to_string())),
        };

        let body: PlanetsBody = response
            .into_json()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(body.planets)
    }
}

impl std::fmt::Debug for PlanetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanetClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
