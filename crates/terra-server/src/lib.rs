//! HTTP service for Terra.
//!
//! Serves `/api/planets` from a [`PlanetQuery`](terra_planets::PlanetQuery),
//! a `/health` probe, and the texture assets under the public directory.

pub mod routes;
pub mod server;

pub use server::{PlanetServer, ServerError};

#[cfg(test)]
mod tests;
