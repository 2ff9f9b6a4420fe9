//! Geometric fallback routes (used when the routing provider is unavailable).
//!
//! Uses great-circle distance with a fixed linear duration estimate.
//! Less accurate than a road network, but it never fails.

use std::f64::consts::PI;

use crate::error::ProviderError;
use crate::geo::{GeoPoint, haversine_km};
use crate::polyline::Polyline;
use crate::resolver::{RouteResult, RouteSource};
use crate::traits::RouteProvider;

/// Kilometers covered per interpolated segment.
const KM_PER_SEGMENT: f64 = 80.0;
const MIN_SEGMENTS: usize = 3;
const MAX_SEGMENTS: usize = 6;

/// Peak lateral offset of interior points, in degrees.
const DEVIATION_DEG: f64 = 0.015;

/// Minutes per kilometer and fixed overhead of the duration estimate.
const MINUTES_PER_KM: f64 = 0.75;
const FIXED_OVERHEAD_MIN: f64 = 15.0;

/// Builds an approximate route between two points.
///
/// The path starts at `origin`, ends at `destination`, and bends slightly
/// perpendicular to the dominant direction of travel.
pub fn synthesize(origin: GeoPoint, destination: GeoPoint) -> RouteResult {
    let distance_km = haversine_km(origin, destination);
    let segments = segment_count(distance_km);

    let delta_lat = destination.latitude - origin.latitude;
    let delta_lng = destination.longitude - origin.longitude;
    let bend_latitude = delta_lat.abs() < delta_lng.abs();

    let mut points = Vec::with_capacity(segments + 1);
    points.push(origin);
    for i in 1..segments {
        let t = i as f64 / segments as f64;
        let offset = DEVIATION_DEG * (t * PI * 1.5).sin();
        let mut latitude = origin.latitude + delta_lat * t;
        let mut longitude = origin.longitude + delta_lng * t;
        if bend_latitude {
            latitude += offset;
        } else {
            longitude += offset;
        }
        points.push(GeoPoint::new(latitude, longitude));
    }
    points.push(destination);

    RouteResult {
        path: Polyline::new(points),
        distance_km,
        duration_min: estimate_duration_min(distance_km),
        source: RouteSource::Fallback,
    }
}

/// Longer hauls get more points, bounded to keep paths small.
fn segment_count(distance_km: f64) -> usize {
    let raw = (distance_km / KM_PER_SEGMENT).round();
    if raw.is_finite() {
        (raw as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
    } else {
        MIN_SEGMENTS
    }
}

fn estimate_duration_min(distance_km: f64) -> f64 {
    (distance_km * MINUTES_PER_KM + FIXED_OVERHEAD_MIN).round()
}

/// A provider that never reaches the network. Every route comes from the
/// fallback generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl RouteProvider for OfflineProvider {
    fn route(&self, _origin: GeoPoint, _destination: GeoPoint) -> Result<RouteResult, ProviderError> {
        Err(ProviderError::Offline)
    }
}
