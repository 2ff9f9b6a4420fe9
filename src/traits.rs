//! Core seams of the routing pipeline.
//!
//! Concrete apps implement [`DeliveryRecord`] for their own delivery model;
//! providers, caches, and optimization policies are swappable.

use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::RouteKey;
use crate::error::ProviderError;
use crate::geo::GeoPoint;
use crate::optimizer::OptimizationEvent;
use crate::resolver::RouteResult;

/// A source of real road routes between two points.
pub trait RouteProvider: Send + Sync {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteResult, ProviderError>;
}

/// Storage for resolved routes, keyed by rounded coordinate pair.
///
/// Implementations must be safe to share between concurrently running
/// resolutions. Two racing inserts for the same key may both land; the
/// last write wins.
pub trait RouteCache: Send + Sync {
    fn get(&self, key: &RouteKey) -> Option<RouteResult>;
    fn set(&self, key: RouteKey, route: RouteResult);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lifecycle status of a delivery.
///
/// Statuses the store may add later (`"delayed"`, `"on_hold"`, ...) read as
/// [`DeliveryStatus::Other`] so a mixed list still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
    Other,
}

impl DeliveryStatus {
    /// Parses the status strings used by the delivery store.
    pub fn parse(value: &str) -> Self {
        match value {
            "planned" => Self::Planned,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl<'de> Deserialize<'de> for DeliveryStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// A delivery as seen by the batch optimizer. Absent fields are replaced
/// with defaults.
pub trait DeliveryRecord {
    fn id(&self) -> Option<&str>;
    fn status(&self) -> DeliveryStatus;
    fn origin(&self) -> Option<&str>;
    fn destination(&self) -> Option<&str>;
    fn vehicle(&self) -> Option<&str>;
    fn driver(&self) -> Option<&str>;
}

/// Fraction of a route's original duration removed by optimization.
pub trait OptimizationFactor: Send + Sync {
    fn factor(&self, original_duration_min: f64) -> f64;
}

impl<F> OptimizationFactor for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn factor(&self, original_duration_min: f64) -> f64 {
        self(original_duration_min)
    }
}

/// Receives status events from an optimization run.
pub trait OptimizationObserver {
    fn on_event(&mut self, event: &OptimizationEvent);
}

impl<F> OptimizationObserver for F
where
    F: FnMut(&OptimizationEvent),
{
    fn on_event(&mut self, event: &OptimizationEvent) {
        self(event)
    }
}

/// An observer that ignores every event.
pub struct NoopObserver;

impl OptimizationObserver for NoopObserver {
    fn on_event(&mut self, _event: &OptimizationEvent) {}
}
