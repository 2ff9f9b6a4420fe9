//! fleet-routing core
//!
//! Route resolution and batch route optimization for delivery planning:
//! city geocoding, a remote routing provider with a deterministic fallback,
//! a per-resolver route cache, and a bounded-concurrency batch optimizer.

pub mod cache;
pub mod cities;
pub mod error;
pub mod fallback;
pub mod geo;
pub mod metrics;
pub mod optimizer;
pub mod osrm;
pub mod osrm_data;
pub mod polyline;
pub mod rate_limit;
pub mod resolver;
pub mod traits;

pub use cache::{InMemoryRouteCache, RouteKey};
pub use cities::CityRegistry;
pub use error::{GeocodeError, OptimizeError, ProviderError};
pub use geo::GeoPoint;
pub use optimizer::{OptimizationResult, OptimizedRoute, OptimizeOptions, RouteOptimizer};
pub use resolver::{RouteResolver, RouteResult, RouteSource};
