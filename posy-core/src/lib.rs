//! Core types and service wiring for the posy florist delivery search.

/// Florist catalog file loading.
pub mod catalog;
/// Environment configuration.
pub mod config;
/// Special-event calendar.
pub mod events;
/// Provider port bundle.
pub mod gateway;
/// Distance math and road-distance fallback.
pub mod geo;
/// Domain models and identifiers.
pub mod model;
/// Traits describing the geocoding provider interfaces.
pub mod ports;
/// Delivery radius filter.
pub mod radius;
/// Cutoff and delivery-slot evaluation.
pub mod schedule;
/// High-level service facade used by clients.
pub mod service;

pub use catalog::*;
pub use config::*;
pub use events::*;
pub use gateway::*;
pub use geo::*;
pub use model::*;
pub use ports::*;
pub use radius::*;
pub use schedule::*;
pub use service::*;
