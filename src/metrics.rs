//! Fleet-level aggregates and display formatting.

use crate::optimizer::OptimizationResult;

/// Share of the original duration saved, as a whole percentage.
///
/// Zero when there is no original duration to compare against.
pub fn optimization_percentage(time_saved_min: f64, original_duration_min: f64) -> f64 {
    if original_duration_min <= 0.0 || !original_duration_min.is_finite() {
        return 0.0;
    }
    (100.0 * time_saved_min / original_duration_min).round()
}

/// Average time saved per route, zero for an empty result.
pub fn average_time_saved_min(result: &OptimizationResult) -> f64 {
    if result.routes.is_empty() {
        return 0.0;
    }
    result.total_time_saved_min / result.routes.len() as f64
}

/// "45 min", "2h", "1h 05min".
pub fn format_duration(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    let (hours, rest) = (total / 60, total % 60);
    match (hours, rest) {
        (0, m) => format!("{} min", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {:02}min", h, m),
    }
}

/// Whole kilometers, with one decimal under 10 km.
pub fn format_distance(km: f64) -> String {
    let km = km.max(0.0);
    if km < 10.0 {
        format!("{:.1} km", km)
    } else {
        format!("{:.0} km", km)
    }
}

/// One-line summary for the planning dashboard.
pub fn summarize(result: &OptimizationResult) -> String {
    format!(
        "{} itinéraire(s), {} au total, {} gagnées ({} %)",
        result.routes.len(),
        format_distance(result.total_distance_km),
        format_duration(result.total_time_saved_min),
        result.optimization_percentage
    )
}
