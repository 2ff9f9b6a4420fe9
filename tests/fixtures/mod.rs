//! Test fixtures for fleet-routing.
//!
//! Provides:
//! - Planned deliveries between registered Moroccan cities
//! - Mock routing providers (counting, slow, failing)

pub mod deliveries;
pub mod providers;

pub use deliveries::*;
pub use providers::*;
