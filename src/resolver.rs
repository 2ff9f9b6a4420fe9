//! Route resolution: cache, then provider, then geometric fallback.

use serde::{Deserialize, Serialize};

use crate::cache::{InMemoryRouteCache, RouteKey};
use crate::error::ProviderError;
use crate::fallback;
use crate::geo::GeoPoint;
use crate::polyline::Polyline;
use crate::traits::{RouteCache, RouteProvider};

/// Where a route's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Road network data from the routing provider.
    Provider,
    /// Great-circle approximation; the path is only indicative.
    Fallback,
}

/// A path with its length and travel time.
///
/// The path has at least two points, starting at the query origin and ending
/// at the query destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub path: Polyline,
    pub distance_km: f64,
    pub duration_min: f64,
    pub source: RouteSource,
}

impl RouteResult {
    pub fn is_approximate(&self) -> bool {
        self.source == RouteSource::Fallback
    }
}

/// Resolves routes between points, never failing.
///
/// Each resolver owns its cache, so independent resolvers do not share
/// entries.
pub struct RouteResolver<P, C = InMemoryRouteCache> {
    provider: P,
    cache: C,
}

impl<P: RouteProvider> RouteResolver<P, InMemoryRouteCache> {
    pub fn new(provider: P) -> Self {
        Self::with_cache(provider, InMemoryRouteCache::new())
    }
}

impl<P: RouteProvider, C: RouteCache> RouteResolver<P, C> {
    pub fn with_cache(provider: P, cache: C) -> Self {
        Self { provider, cache }
    }

    /// Returns the cached route for the rounded pair, or asks the provider
    /// once and falls back to a synthetic route on any provider failure.
    ///
    /// Fallback routes are cached too, so a failing pair is not retried for
    /// the lifetime of the cache.
    pub fn resolve(&self, origin: GeoPoint, destination: GeoPoint) -> RouteResult {
        let key = RouteKey::new(origin, destination);
        if let Some(route) = self.cache.get(&key) {
            tracing::debug!(%origin, %destination, "route cache hit");
            return route;
        }
        tracing::debug!(%origin, %destination, "route cache miss");

        let route = match self.fetch(origin, destination) {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!(%origin, %destination, error = %err, "routing provider failed, using fallback route");
                fallback::synthesize(origin, destination)
            }
        };

        self.cache.set(key, route.clone());
        route
    }

    /// Asks the provider directly, bypassing the cache and the fallback.
    pub fn fetch(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteResult, ProviderError> {
        self.provider.route(origin, destination)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::OfflineProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CASABLANCA: GeoPoint = GeoPoint::new(33.5731, -7.5898);
    const RABAT: GeoPoint = GeoPoint::new(34.0209, -6.8416);

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl RouteProvider for CountingProvider {
        fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Timeout);
            }
            Ok(RouteResult {
                path: Polyline::new(vec![origin, destination]),
                distance_km: 92.0,
                duration_min: 65.0,
                source: RouteSource::Provider,
            })
        }
    }

    #[test]
    fn test_second_resolve_hits_cache() {
        let resolver = RouteResolver::new(CountingProvider::new(false));
        let first = resolver.resolve(CASABLANCA, RABAT);
        let second = resolver.resolve(CASABLANCA, RABAT);
        assert_eq!(first, second);
        assert_eq!(resolver.provider().calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.source, RouteSource::Provider);
    }

    #[test]
    fn test_near_duplicate_query_hits_cache() {
        let resolver = RouteResolver::new(CountingProvider::new(false));
        resolver.resolve(CASABLANCA, RABAT);
        resolver.resolve(GeoPoint::new(33.57312, -7.58979), RABAT);
        assert_eq!(resolver.provider().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_falls_back_and_is_cached() {
        let resolver = RouteResolver::new(CountingProvider::new(true));
        let first = resolver.resolve(CASABLANCA, RABAT);
        let second = resolver.resolve(CASABLANCA, RABAT);
        assert!(first.is_approximate());
        assert_eq!(first, second);
        assert_eq!(resolver.provider().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_cache_forces_new_request() {
        let resolver = RouteResolver::new(CountingProvider::new(false));
        resolver.resolve(CASABLANCA, RABAT);
        resolver.clear_cache();
        assert!(resolver.cache().is_empty());
        resolver.resolve(CASABLANCA, RABAT);
        assert_eq!(resolver.provider().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fetch_exposes_provider_error() {
        let resolver = RouteResolver::new(OfflineProvider);
        assert!(matches!(resolver.fetch(CASABLANCA, RABAT), Err(ProviderError::Offline)));
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_resolvers_do_not_share_cache() {
        let a = RouteResolver::new(OfflineProvider);
        let b = RouteResolver::new(OfflineProvider);
        a.resolve(CASABLANCA, RABAT);
        assert_eq!(a.cache().len(), 1);
        assert!(b.cache().is_empty());
    }
}
