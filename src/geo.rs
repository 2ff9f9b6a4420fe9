//! Geographic coordinate type and great-circle distance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Builds a point without range checks. Use for trusted constants.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point, rejecting latitudes outside [-90, 90] and longitudes
    /// outside [-180, 180].
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, GeocodeError> {
        let point = Self::new(latitude, longitude);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(GeocodeError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Haversine great-circle distance in kilometers.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(*self, *other)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two points on a spherical Earth.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASABLANCA: GeoPoint = GeoPoint::new(33.5731, -7.5898);
    const RABAT: GeoPoint = GeoPoint::new(34.0209, -6.8416);

    #[test]
    fn test_haversine_same_point() {
        assert_eq!(haversine_km(CASABLANCA, CASABLANCA), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Casablanca to Rabat is roughly 87 km as the crow flies
        let dist = haversine_km(CASABLANCA, RABAT);
        assert!(dist > 80.0 && dist < 95.0, "Casablanca to Rabat should be ~87km, got {}", dist);
    }

    #[test]
    fn test_haversine_symmetric() {
        let marrakech = GeoPoint::new(31.6295, -7.9811);
        let oujda = GeoPoint::new(34.6814, -1.9086);
        assert_eq!(haversine_km(marrakech, oujda), haversine_km(oujda, marrakech));
        assert_eq!(CASABLANCA.distance_km(&RABAT), RABAT.distance_km(&CASABLANCA));
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert!(GeoPoint::try_new(91.0, 0.0).is_err());
        assert!(GeoPoint::try_new(0.0, -180.5).is_err());
        assert!(GeoPoint::try_new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::try_new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(CASABLANCA.to_string(), "(33.5731, -7.5898)");
    }
}
