//! City registry: static name → coordinate table for geocoding.
//!
//! Names match exactly as registered. There is no case folding, no
//! diacritics folding and no fuzzy matching.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::GeocodeError;
use crate::geo::GeoPoint;

const MOROCCAN_CITIES: &[(&str, f64, f64)] = &[
    ("Casablanca", 33.5731, -7.5898),
    ("Rabat", 34.0209, -6.8416),
    ("Marrakech", 31.6295, -7.9811),
    ("Fès", 34.0181, -5.0078),
    ("Tanger", 35.7595, -5.8340),
    ("Agadir", 30.4278, -9.5981),
    ("Meknès", 33.8935, -5.5473),
    ("Oujda", 34.6814, -1.9086),
    ("Kénitra", 34.2610, -6.5802),
    ("Tétouan", 35.5889, -5.3626),
    ("Safi", 32.2994, -9.2372),
    ("El Jadida", 33.2316, -8.5007),
    ("Nador", 35.1681, -2.9335),
    ("Béni Mellal", 32.3373, -6.3498),
    ("Khouribga", 32.8811, -6.9063),
    ("Mohammedia", 33.6861, -7.3829),
    ("Settat", 33.0011, -7.6166),
    ("Essaouira", 31.5085, -9.7595),
    ("Ouarzazate", 30.9189, -6.8934),
    ("Errachidia", 31.9314, -4.4244),
    ("Laâyoune", 27.1253, -13.1625),
];

static MOROCCO: LazyLock<CityRegistry> = LazyLock::new(|| {
    CityRegistry::from_entries(
        MOROCCAN_CITIES
            .iter()
            .map(|&(name, lat, lng)| (name, GeoPoint::new(lat, lng))),
    )
});

/// Read-only mapping from city name to coordinates.
#[derive(Debug, Clone, Default)]
pub struct CityRegistry {
    cities: HashMap<String, GeoPoint>,
}

impl CityRegistry {
    /// Process-wide registry of the Moroccan cities served by the fleet.
    pub fn morocco() -> &'static CityRegistry {
        &MOROCCO
    }

    /// Builds a registry from `(name, point)` pairs. Later duplicates win.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, GeoPoint)>,
        S: Into<String>,
    {
        Self {
            cities: entries
                .into_iter()
                .map(|(name, point)| (name.into(), point))
                .collect(),
        }
    }

    pub fn lookup(&self, city: &str) -> Result<GeoPoint, GeocodeError> {
        self.cities
            .get(city)
            .copied()
            .ok_or_else(|| GeocodeError::UnknownCity(city.to_string()))
    }

    pub fn contains(&self, city: &str) -> bool {
        self.cities.contains_key(city)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// Looks up `city` in the Moroccan registry.
pub fn lookup(city: &str) -> Result<GeoPoint, GeocodeError> {
    CityRegistry::morocco().lookup(city)
}
