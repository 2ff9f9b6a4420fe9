//! Delivery fixtures between registered Moroccan cities.

use fleet_routing::optimizer::Delivery;
use fleet_routing::traits::DeliveryStatus;

/// Distinct origin/destination pairs, so no two deliveries share a cache key.
pub const CITY_PAIRS: &[(&str, &str)] = &[
    ("Casablanca", "Rabat"),
    ("Marrakech", "Agadir"),
    ("Fès", "Meknès"),
    ("Tanger", "Tétouan"),
    ("Oujda", "Nador"),
    ("Kénitra", "Rabat"),
    ("Safi", "El Jadida"),
    ("Béni Mellal", "Khouribga"),
    ("Essaouira", "Marrakech"),
    ("Settat", "Casablanca"),
];

/// `count` planned deliveries with ids "d1", "d2", ...
pub fn planned_deliveries(count: usize) -> Vec<Delivery> {
    CITY_PAIRS
        .iter()
        .cycle()
        .take(count)
        .enumerate()
        .map(|(i, (origin, destination))| Delivery::planned(&format!("d{}", i + 1), origin, destination))
        .collect()
}

pub fn delivery_with_status(id: &str, status: DeliveryStatus) -> Delivery {
    Delivery {
        id: Some(id.to_string()),
        ..Delivery::new(status)
    }
}
