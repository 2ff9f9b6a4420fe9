//! OSRM HTTP adapter for driving routes.

use std::num::NonZeroU32;
use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::geo::GeoPoint;
use crate::polyline::Polyline;
use crate::rate_limit::{self, Limiter};
use crate::resolver::{RouteResult, RouteSource};
use crate::traits::RouteProvider;

const DEFAULT_BURST: NonZeroU32 = match NonZeroU32::new(3) {
    Some(burst) => burst,
    None => unreachable!(),
};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Service root up to and including the API version, e.g.
    /// `https://router.project-osrm.org/route/v1`.
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
    /// Sustained request rate; `None` disables limiting.
    pub requests_per_second: Option<NonZeroU32>,
    pub burst: NonZeroU32,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org/route/v1".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 5,
            requests_per_second: NonZeroU32::new(6),
            burst: DEFAULT_BURST,
        }
    }
}

#[derive(Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
    limiter: Option<Limiter>,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let limiter = config
            .requests_per_second
            .map(|per_second| rate_limit::provider_limiter(per_second, config.burst));

        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    /// Route URL for a pair of points. OSRM expects `lng,lat` order.
    pub fn route_url(&self, origin: GeoPoint, destination: GeoPoint) -> String {
        format!(
            "{}/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteResult, ProviderError> {
        if let Some(limiter) = &self.limiter {
            rate_limit::wait(limiter);
        }

        let url = self.route_url(origin, destination);
        tracing::debug!(%url, "requesting route");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        parse_route_response(&body, origin, destination)
    }
}

/// Converts an OSRM `route` response body into a [`RouteResult`].
///
/// Uses the first route only. Distance is converted to whole kilometers and
/// duration to whole minutes.
pub fn parse_route_response(
    body: &str,
    origin: GeoPoint,
    destination: GeoPoint,
) -> Result<RouteResult, ProviderError> {
    let response: OsrmRouteResponse = serde_json::from_str(body)?;
    let route = response.routes.into_iter().next().ok_or(ProviderError::NoRoute)?;

    if !route.distance.is_finite() || route.distance < 0.0 {
        return Err(ProviderError::Malformed(format!("distance {}", route.distance)));
    }
    if !route.duration.is_finite() || route.duration < 0.0 {
        return Err(ProviderError::Malformed(format!("duration {}", route.duration)));
    }

    let path = Polyline::from_lng_lat(&route.geometry.coordinates);
    if let Some(bad) = path.points().iter().find(|point| !point.is_valid()) {
        return Err(ProviderError::Malformed(format!("geometry point {}", bad)));
    }

    Ok(RouteResult {
        path: path.anchored(origin, destination),
        distance_km: (route.distance / 1000.0).round(),
        duration_min: (route.duration / 60.0).round(),
        source: RouteSource::Provider,
    })
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASABLANCA: GeoPoint = GeoPoint::new(33.5731, -7.5898);
    const RABAT: GeoPoint = GeoPoint::new(34.0209, -6.8416);

    #[test]
    fn test_route_url_uses_lng_lat_order() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://localhost:5000/route/v1/".to_string(),
            ..OsrmConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.route_url(CASABLANCA, RABAT),
            "http://localhost:5000/route/v1/driving/-7.589800,33.573100;-6.841600,34.020900?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_default_config() {
        let config = OsrmConfig::default();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.burst.get(), 3);
        assert_eq!(config.requests_per_second.map(NonZeroU32::get), Some(6));
    }

    #[test]
    fn test_parse_valid_response() {
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 91456.2,
                "duration": 4030.0,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-7.5898, 33.5731], [-7.2, 33.8], [-6.8416, 34.0209]]
                }
            }]
        }"#;
        let route = parse_route_response(body, CASABLANCA, RABAT).unwrap();
        assert_eq!(route.distance_km, 91.0);
        assert_eq!(route.duration_min, 67.0);
        assert_eq!(route.source, RouteSource::Provider);
        assert_eq!(route.path.len(), 3);
        assert_eq!(route.path.points()[1], GeoPoint::new(33.8, -7.2));
    }

    #[test]
    fn test_parse_anchors_snapped_geometry() {
        let body = r#"{"routes":[{"distance":1000,"duration":60,
            "geometry":{"coordinates":[[-7.5897,33.5730],[-6.8415,34.0208]]}}]}"#;
        let route = parse_route_response(body, CASABLANCA, RABAT).unwrap();
        assert_eq!(route.path.first(), Some(&CASABLANCA));
        assert_eq!(route.path.last(), Some(&RABAT));
        assert_eq!(route.path.len(), 4);
    }

    #[test]
    fn test_parse_empty_routes() {
        let err = parse_route_response(r#"{"code":"NoRoute","routes":[]}"#, CASABLANCA, RABAT).unwrap_err();
        assert!(matches!(err, ProviderError::NoRoute));

        let err = parse_route_response(r#"{"code":"NoRoute"}"#, CASABLANCA, RABAT).unwrap_err();
        assert!(matches!(err, ProviderError::NoRoute));
    }

    #[test]
    fn test_parse_malformed_payload() {
        let err = parse_route_response("<html>busy</html>", CASABLANCA, RABAT).unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));

        let body = r#"{"routes":[{"distance":-5,"duration":60,"geometry":{"coordinates":[]}}]}"#;
        let err = parse_route_response(body, CASABLANCA, RABAT).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));

        let body = r#"{"routes":[{"distance":5,"duration":60,"geometry":{"coordinates":[[200.0, 10.0]]}}]}"#;
        let err = parse_route_response(body, CASABLANCA, RABAT).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn test_unreachable_server_is_an_error() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://127.0.0.1:9/route/v1".to_string(),
            timeout_secs: 2,
            requests_per_second: None,
            ..OsrmConfig::default()
        })
        .unwrap();
        assert!(client.route(CASABLANCA, RABAT).is_err());
    }
}
