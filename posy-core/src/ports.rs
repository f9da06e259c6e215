//! Traits describing geocoding gateway capabilities and shared helper types.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{AddressCandidate, CandidateId, Coordinate, ResolvedAddress};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the geocoding provider.
pub enum GatewayError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Provider answered with a non-OK status such as `OVER_QUERY_LIMIT`.
    #[error("Provider status {status}: {message}")]
    Status {
        /// Provider status code.
        status: String,
        /// Provider error message, if any.
        message: String,
    },
    /// Candidate or route could not be found.
    #[error("Not found")]
    NotFound,
    /// Response did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Provider client could not be initialised.
    #[error("Initialisation failed: {0}")]
    Init(String),
}

#[derive(Debug, Clone)]
/// Free-text address query.
pub struct AddressQuery {
    /// Text typed by the user.
    pub text: String,
    /// Maximum number of candidates to return.
    pub limit: usize,
}

impl AddressQuery {
    /// Construct a new query.
    #[must_use]
    pub fn new<S: Into<String>>(text: S, limit: usize) -> Self {
        Self {
            text: text.into(),
            limit,
        }
    }

    /// Check if the query is empty or whitespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[async_trait]
/// Address autocomplete and resolution.
pub trait AddressPort: Send + Sync {
    /// Suggest addresses for free text. Empty queries return no candidates
    /// without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the provider is unreachable or rejects the query.
    async fn search_address(
        &self,
        query: &AddressQuery,
    ) -> Result<Vec<AddressCandidate>, GatewayError>;

    /// Resolve a candidate into a structured address with a coordinate.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the provider request fails or the id is unknown.
    async fn resolve_candidate(&self, id: &CandidateId) -> Result<ResolvedAddress, GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Result of a live routing call.
pub struct TravelDistance {
    /// Driving distance in kilometres.
    pub distance_km: f64,
    /// Driving duration in minutes.
    pub duration_min: u32,
}

#[async_trait]
/// Live driving distance lookup. Implementations do not degrade silently.
pub trait RoutingPort: Send + Sync {
    /// Single routing call between two points.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on any failure; callers decide how to fall back.
    async fn travel_distance(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<TravelDistance, GatewayError>;
}
