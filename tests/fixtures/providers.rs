//! Mock routing providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use fleet_routing::error::ProviderError;
use fleet_routing::geo::GeoPoint;
use fleet_routing::polyline::Polyline;
use fleet_routing::resolver::{RouteResult, RouteSource};
use fleet_routing::traits::RouteProvider;

/// Answers every request with a straight road 1.2x the great-circle
/// distance at 60 km/h, after an optional delay. Tracks calls and the
/// highest number of requests in flight at once.
#[derive(Default)]
pub struct MockProvider {
    pub delay: Duration,
    /// Vary the delay per request so completion order differs from
    /// submission order.
    pub jitter: bool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn jittery(delay: Duration) -> Self {
        Self {
            delay,
            jitter: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl RouteProvider for MockProvider {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteResult, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = if self.jitter {
            // Later submissions finish first within a batch
            self.delay * (3 - (call % 3) as u32)
        } else {
            self.delay
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let distance_km = (origin.distance_km(&destination) * 1.2).round();
        Ok(RouteResult {
            path: Polyline::new(vec![origin, destination]),
            distance_km,
            duration_min: distance_km,
            source: RouteSource::Provider,
        })
    }
}

/// Always fails, like a provider behind a dead network.
pub struct FailingProvider;

impl RouteProvider for FailingProvider {
    fn route(&self, _origin: GeoPoint, _destination: GeoPoint) -> Result<RouteResult, ProviderError> {
        Err(ProviderError::Http { status: 503 })
    }
}
