//! Planet data for the Terra service.
//!
//! [`PlanetRecord`] is the unit of data, a [`PlanetProvider`] produces records
//! by name, and [`PlanetQuery`] turns a `?name=` request into the JSON body the
//! HTTP layer sends back.

pub mod provider;
pub mod query;
pub mod record;

pub use provider::{
    ApiKey, PlanetProvider, ProviderError, StaticProvider, UpstreamProvider, UpstreamSettings,
    build_provider,
};
pub use query::{PlanetQuery, QueryBody, QueryResponse};
pub use record::{PlanetRecord, REFERENCE_PLANET};
