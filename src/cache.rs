//! In-memory route cache keyed by rounded coordinate pairs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::geo::GeoPoint;
use crate::resolver::RouteResult;
use crate::traits::RouteCache;

/// Decimal places kept in a cache key (about 11 m at the equator).
pub const KEY_PRECISION: i32 = 4;

/// Origin/destination pair rounded to [`KEY_PRECISION`] decimals.
///
/// Near-duplicate queries share a key. Direction matters: A→B and B→A are
/// distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: (i64, i64),
    destination: (i64, i64),
}

impl RouteKey {
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin: round_point(origin),
            destination: round_point(destination),
        }
    }
}

fn round_point(point: GeoPoint) -> (i64, i64) {
    let scale = 10f64.powi(KEY_PRECISION);
    (
        (point.latitude * scale).round() as i64,
        (point.longitude * scale).round() as i64,
    )
}

#[derive(Debug, Default)]
struct Entries {
    routes: HashMap<RouteKey, RouteResult>,
    order: VecDeque<RouteKey>,
}

/// Thread-safe route cache. Entries never expire; with a capacity set, the
/// oldest inserted entry is evicted first.
#[derive(Debug, Default)]
pub struct InMemoryRouteCache {
    entries: Mutex<Entries>,
    capacity: Option<usize>,
}

impl InMemoryRouteCache {
    /// Unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` routes (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::default(),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RouteCache for InMemoryRouteCache {
    fn get(&self, key: &RouteKey) -> Option<RouteResult> {
        self.lock().routes.get(key).cloned()
    }

    fn set(&self, key: RouteKey, route: RouteResult) {
        let mut entries = self.lock();
        if entries.routes.insert(key, route).is_none() {
            entries.order.push_back(key);
        }

        if let Some(capacity) = self.capacity {
            while entries.routes.len() > capacity {
                let Some(oldest) = entries.order.pop_front() else {
                    break;
                };
                entries.routes.remove(&oldest);
                tracing::debug!(capacity, "evicted oldest cached route");
            }
        }
    }

    fn clear(&self) {
        let mut entries = self.lock();
        entries.routes.clear();
        entries.order.clear();
    }

    fn len(&self) -> usize {
        self.lock().routes.len()
    }
}
