//! Polyline representation for route geometries.
//!
//! Provider responses arrive as `[lng, lat]` pairs; they are transposed at
//! the boundary so everything inside the crate works with [`GeoPoint`]s.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// An ordered route path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Builds a polyline from GeoJSON `[lng, lat]` pairs.
    pub fn from_lng_lat(coordinates: &[[f64; 2]]) -> Self {
        Self {
            points: coordinates
                .iter()
                .map(|&[lng, lat]| GeoPoint::new(lat, lng))
                .collect(),
        }
    }

    /// Ensures the path starts at `origin` and ends at `destination`,
    /// adding the endpoints when the geometry was snapped elsewhere.
    pub fn anchored(mut self, origin: GeoPoint, destination: GeoPoint) -> Self {
        if self.points.first() != Some(&origin) {
            self.points.insert(0, origin);
        }
        if self.points.len() < 2 || self.points.last() != Some(&destination) {
            self.points.push(destination);
        }
        self
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&GeoPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    /// Sum of Haversine distances between consecutive points.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_km(&pair[1]))
            .sum()
    }
}
