//! The `/api/planets` query logic, independent of the HTTP server.

use std::sync::Arc;

use serde::Serialize;

use crate::provider::{PlanetProvider, ProviderError};
use crate::record::{PlanetRecord, REFERENCE_PLANET};

/// JSON body of a query response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryBody {
    Planets {
        planets: Vec<PlanetRecord>,
    },
    NotFound {
        message: String,
        planets: Vec<PlanetRecord>,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Status code and body for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub status: u16,
    pub body: QueryBody,
}

impl QueryResponse {
    fn ok(body: QueryBody) -> Self {
        Self { status: 200, body }
    }

    fn internal_error(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status: 500,
            body: QueryBody::Error {
                error: error.into(),
                message,
            },
        }
    }

    /// The records in the body, empty for errors.
    pub fn planets(&self) -> &[PlanetRecord] {
        match &self.body {
            QueryBody::Planets { planets } | QueryBody::NotFound { planets, .. } => planets,
            QueryBody::Error { .. } => &[],
        }
    }
}

/// Answers planet queries from a single provider.
///
/// Built from the outcome of provider construction: a provider that could not
/// be configured turns every query into a 500.
pub struct PlanetQuery {
    provider: Result<Arc<dyn PlanetProvider>, ProviderError>,
}

impl PlanetQuery {
    pub fn new(provider: Result<Arc<dyn PlanetProvider>, ProviderError>) -> Self {
        if let Err(e) = &provider {
            tracing::warn!("Planet endpoint is unconfigured: {e}");
        }
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_ok()
    }

    /// Handle `?name=<name>`. A missing or empty name means the reference planet.
    pub fn handle(&self, name: Option<&str>) -> QueryResponse {
        let provider = match &self.provider {
            Ok(provider) => provider,
            Err(e) => return QueryResponse::internal_error(e.to_string(), None),
        };

        // Passed through untrimmed; only an empty name falls back.
        let name = name.filter(|n| !n.is_empty()).unwrap_or(REFERENCE_PLANET);

        match Self::lookup(provider.as_ref(), name) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(name, "Error fetching planet data: {e}");
                QueryResponse::internal_error("Failed to fetch planet data", Some(e.to_string()))
            }
        }
    }

    fn lookup(provider: &dyn PlanetProvider, name: &str) -> Result<QueryResponse, ProviderError> {
        if name.eq_ignore_ascii_case(REFERENCE_PLANET) {
            tracing::info!("Fetching {REFERENCE_PLANET} data");
            let planets = tag_all(provider.fetch(REFERENCE_PLANET)?, true);
            return Ok(QueryResponse::ok(QueryBody::Planets { planets }));
        }

        tracing::info!("Fetching data for: {name} and {REFERENCE_PLANET}");
        let (requested, reference) = rayon::join(
            || provider.fetch(name),
            || provider.fetch(REFERENCE_PLANET),
        );
        let (requested, reference) = (requested?, reference?);

        let mut planets = tag_all(reference, true);
        if requested.is_empty() {
            return Ok(QueryResponse::ok(QueryBody::NotFound {
                message: format!("No planets found matching '{name}'"),
                planets,
            }));
        }
        planets.extend(tag_all(requested, false));
        Ok(QueryResponse::ok(QueryBody::Planets { planets }))
    }
}

fn tag_all(records: Vec<PlanetRecord>, is_reference: bool) -> Vec<PlanetRecord> {
    records
        .into_iter()
        .map(|record| record.tagged(is_reference))
        .collect()
}
