//! Error types for geocoding, routing providers, and optimization runs.

use thiserror::Error;

/// Failures resolving a place name or coordinate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("unknown city: {0}")]
    UnknownCity(String),

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Failures talking to a remote routing provider.
///
/// The resolver recovers from all of these with the fallback generator.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("routing provider timed out")]
    Timeout,

    #[error("routing provider returned HTTP {status}")]
    Http { status: u16 },

    #[error("routing request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to parse routing response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed routing response: {0}")]
    Malformed(String),

    #[error("routing provider returned no route")]
    NoRoute,

    #[error("routing provider is offline")]
    Offline,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = err.status() {
            ProviderError::Http {
                status: status.as_u16(),
            }
        } else {
            ProviderError::Request(err)
        }
    }
}

/// Failures that end an optimization run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("an optimization run is already in progress")]
    AlreadyRunning,

    #[error("optimization run was cancelled")]
    Cancelled,

    #[error("delivery {delivery_id}: {source}")]
    UnknownCity {
        delivery_id: String,
        #[source]
        source: GeocodeError,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failures preparing an OSRM dataset.
#[derive(Debug, Error)]
pub enum OsrmDataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("process failed: {0}")]
    ProcessFailure(String),
}
