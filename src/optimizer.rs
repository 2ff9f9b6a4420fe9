//! Batch route optimization for planned deliveries.
//!
//! Planned deliveries are geocoded, routed through the resolver in batches
//! of bounded concurrency, and given an estimated time saving. Batches run
//! one after another; results keep input order.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::InMemoryRouteCache;
use crate::cities::CityRegistry;
use crate::error::{GeocodeError, OptimizeError};
use crate::metrics;
use crate::polyline::Polyline;
use crate::resolver::{RouteResolver, RouteSource};
use crate::traits::{
    DeliveryRecord, DeliveryStatus, NoopObserver, OptimizationFactor, OptimizationObserver,
    RouteCache, RouteProvider,
};

/// What to do with a delivery whose origin or destination is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCityPolicy {
    /// Fail the whole run; routes already computed are discarded.
    #[default]
    AbortRun,
    /// Leave the delivery out and report it in [`OptimizationResult::skipped`].
    SkipDelivery,
}

#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Deliveries resolved concurrently per batch.
    pub batch_size: usize,
    /// Lower bound for an optimized duration, in minutes.
    pub min_optimized_duration_min: f64,
    pub unknown_city_policy: UnknownCityPolicy,
    /// City used when a delivery has no origin.
    pub default_origin: String,
    /// City used when a delivery has no destination.
    pub default_destination: String,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            batch_size: 3,
            min_optimized_duration_min: 30.0,
            unknown_city_policy: UnknownCityPolicy::AbortRun,
            default_origin: "Casablanca".to_string(),
            default_destination: "Rabat".to_string(),
        }
    }
}

/// `base + U[0, range)`, sampled per route.
pub struct RandomFactor {
    base: f64,
    range: f64,
    rng: Mutex<SmallRng>,
}

impl RandomFactor {
    pub fn new(base: f64, range: f64) -> Self {
        Self::from_rng(base, range, SmallRng::from_entropy())
    }

    /// Reproducible sampling for a given seed.
    pub fn seeded(base: f64, range: f64, seed: u64) -> Self {
        Self::from_rng(base, range, SmallRng::seed_from_u64(seed))
    }

    fn from_rng(base: f64, range: f64, rng: SmallRng) -> Self {
        Self {
            base,
            range,
            rng: Mutex::new(rng),
        }
    }
}

impl Default for RandomFactor {
    fn default() -> Self {
        Self::new(0.12, 0.13)
    }
}

impl OptimizationFactor for RandomFactor {
    fn factor(&self, _original_duration_min: f64) -> f64 {
        if self.range <= 0.0 || !self.range.is_finite() {
            return self.base;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.base + rng.gen_range(0.0..self.range)
    }
}

/// The same factor for every route.
#[derive(Debug, Clone, Copy)]
pub struct FixedFactor(pub f64);

impl OptimizationFactor for FixedFactor {
    fn factor(&self, _original_duration_min: f64) -> f64 {
        self.0
    }
}

/// A delivery record with optional fields, as stored by the planning screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub id: Option<String>,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
}

impl Delivery {
    pub fn new(status: DeliveryStatus) -> Self {
        Self {
            id: None,
            status,
            origin: None,
            destination: None,
            vehicle: None,
            driver: None,
        }
    }

    pub fn planned(id: &str, origin: &str, destination: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            origin: Some(origin.to_string()),
            destination: Some(destination.to_string()),
            ..Self::new(DeliveryStatus::Planned)
        }
    }

    pub fn with_vehicle(mut self, vehicle: &str) -> Self {
        self.vehicle = Some(vehicle.to_string());
        self
    }

    pub fn with_driver(mut self, driver: &str) -> Self {
        self.driver = Some(driver.to_string());
        self
    }
}

impl DeliveryRecord for Delivery {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn status(&self) -> DeliveryStatus {
        self.status
    }

    fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    fn vehicle(&self) -> Option<&str> {
        self.vehicle.as_deref()
    }

    fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub vehicle: String,
    pub driver: String,
    pub original_duration_min: f64,
    pub optimized_duration_min: f64,
    pub time_saved_min: f64,
    pub distance_km: f64,
    pub path: Polyline,
    pub source: RouteSource,
}

/// A delivery left out under [`UnknownCityPolicy::SkipDelivery`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDelivery {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub routes: Vec<OptimizedRoute>,
    pub skipped: Vec<SkippedDelivery>,
    pub total_time_saved_min: f64,
    pub total_distance_km: f64,
    pub total_original_duration_min: f64,
    pub optimization_percentage: f64,
}

impl OptimizationResult {
    pub fn from_routes(routes: Vec<OptimizedRoute>, skipped: Vec<SkippedDelivery>) -> Self {
        let total_time_saved_min = routes.iter().map(|route| route.time_saved_min).sum();
        let total_distance_km = routes.iter().map(|route| route.distance_km).sum();
        let total_original_duration_min = routes.iter().map(|route| route.original_duration_min).sum();

        Self {
            optimization_percentage: metrics::optimization_percentage(
                total_time_saved_min,
                total_original_duration_min,
            ),
            routes,
            skipped,
            total_time_saved_min,
            total_distance_km,
            total_original_duration_min,
        }
    }

    /// Routes computed without provider data.
    pub fn approximate_routes(&self) -> usize {
        self.routes.iter().filter(|route| route.source == RouteSource::Fallback).count()
    }
}

/// Status updates for the planning UI. `Display` gives the user-facing text.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationEvent {
    Started { deliveries: usize },
    BatchCompleted { batch: usize, batches: usize },
    Succeeded { routes: usize, total_time_saved_min: f64 },
    NoWork,
    Failed { reason: String },
}

impl fmt::Display for OptimizationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { deliveries } => {
                write!(f, "Optimisation de {} itinéraire(s) en cours…", deliveries)
            }
            Self::BatchCompleted { batch, batches } => {
                write!(f, "Lot {}/{} traité", batch, batches)
            }
            Self::Succeeded {
                routes,
                total_time_saved_min,
            } => write!(
                f,
                "{} itinéraire(s) optimisé(s), {} gagnées",
                routes,
                metrics::format_duration(*total_time_saved_min)
            ),
            Self::NoWork => write!(f, "Aucune livraison planifiée à optimiser"),
            Self::Failed { .. } => {
                write!(f, "Échec de l'optimisation des itinéraires. Veuillez réessayer plus tard.")
            }
        }
    }
}

/// Shared flag for stopping a run between deliveries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a single delivery produced no route.
enum DeliveryFailure {
    UnknownCity { id: String, error: GeocodeError },
    Cancelled,
}

/// Marks the optimizer as running until dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(running))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Upper bound on worker threads per run, whatever the batch size.
pub const MAX_WORKER_THREADS: usize = 16;

/// Threads needed for a run: one per in-flight delivery, never more than
/// there are eligible deliveries or [`MAX_WORKER_THREADS`].
fn worker_threads(batch_size: usize, eligible: usize) -> usize {
    batch_size.min(eligible).clamp(1, MAX_WORKER_THREADS)
}

/// Splits `original` into time saved and optimized duration.
///
/// The factor is clamped to [0, 1], so `0 <= saved <= original`. The
/// optimized duration never drops below `floor`.
pub fn apply_factor(original_duration_min: f64, factor: f64, floor: f64) -> (f64, f64) {
    let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };
    let original = original_duration_min.max(0.0);
    let saved = (original * factor).round().clamp(0.0, original);
    let optimized = (original - saved).max(floor);
    (saved, optimized)
}

pub struct RouteOptimizer<P, C = InMemoryRouteCache> {
    resolver: RouteResolver<P, C>,
    registry: CityRegistry,
    options: OptimizeOptions,
    factor: Box<dyn OptimizationFactor>,
    running: AtomicBool,
}

impl<P: RouteProvider, C: RouteCache> RouteOptimizer<P, C> {
    /// Optimizer over the Moroccan city registry with default options and
    /// the random optimization factor.
    pub fn new(resolver: RouteResolver<P, C>) -> Self {
        Self {
            resolver,
            registry: CityRegistry::morocco().clone(),
            options: OptimizeOptions::default(),
            factor: Box::new(RandomFactor::default()),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_options(mut self, options: OptimizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_registry(mut self, registry: CityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_factor(mut self, factor: impl OptimizationFactor + 'static) -> Self {
        self.factor = Box::new(factor);
        self
    }

    pub fn options(&self) -> &OptimizeOptions {
        &self.options
    }

    pub fn resolver(&self) -> &RouteResolver<P, C> {
        &self.resolver
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn clear_cache(&self) {
        self.resolver.clear_cache();
    }

    /// Optimizes the planned deliveries. `Ok(None)` means none were planned.
    pub fn optimize<D>(&self, deliveries: &[D]) -> Result<Option<OptimizationResult>, OptimizeError>
    where
        D: DeliveryRecord + Sync,
    {
        self.run(deliveries, &mut NoopObserver, &CancelToken::new())
    }

    /// Like [`optimize`](Self::optimize), reporting progress to `observer`
    /// and stopping early once `cancel` fires.
    ///
    /// Only one run may be active per optimizer; a concurrent call fails with
    /// [`OptimizeError::AlreadyRunning`] without emitting events.
    pub fn run<D, O>(
        &self,
        deliveries: &[D],
        observer: &mut O,
        cancel: &CancelToken,
    ) -> Result<Option<OptimizationResult>, OptimizeError>
    where
        D: DeliveryRecord + Sync,
        O: OptimizationObserver + ?Sized,
    {
        let _guard = RunGuard::acquire(&self.running).ok_or(OptimizeError::AlreadyRunning)?;

        let eligible: Vec<&D> = deliveries
            .iter()
            .filter(|delivery| delivery.status() == DeliveryStatus::Planned)
            .collect();

        if eligible.is_empty() {
            tracing::info!(total = deliveries.len(), "no planned deliveries to optimize");
            observer.on_event(&OptimizationEvent::NoWork);
            return Ok(None);
        }

        tracing::info!(eligible = eligible.len(), total = deliveries.len(), "starting route optimization");
        observer.on_event(&OptimizationEvent::Started {
            deliveries: eligible.len(),
        });

        match self.optimize_eligible(&eligible, observer, cancel) {
            Ok(result) => {
                tracing::info!(
                    routes = result.routes.len(),
                    skipped = result.skipped.len(),
                    time_saved_min = result.total_time_saved_min,
                    percentage = result.optimization_percentage,
                    average_saved_min = metrics::average_time_saved_min(&result),
                    "route optimization finished"
                );
                tracing::debug!(summary = %metrics::summarize(&result), "optimization summary");
                observer.on_event(&OptimizationEvent::Succeeded {
                    routes: result.routes.len(),
                    total_time_saved_min: result.total_time_saved_min,
                });
                Ok(Some(result))
            }
            Err(err) => {
                tracing::error!(error = %err, "route optimization failed");
                observer.on_event(&OptimizationEvent::Failed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn optimize_eligible<D, O>(
        &self,
        eligible: &[&D],
        observer: &mut O,
        cancel: &CancelToken,
    ) -> Result<OptimizationResult, OptimizeError>
    where
        D: DeliveryRecord + Sync,
        O: OptimizationObserver + ?Sized,
    {
        let batch_size = self.options.batch_size.max(1);
        let batches = eligible.len().div_ceil(batch_size);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads(batch_size, eligible.len()))
            .build()?;

        let mut routes = Vec::with_capacity(eligible.len());
        let mut skipped = Vec::new();

        for (batch_index, batch) in eligible.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                return Err(OptimizeError::Cancelled);
            }

            let offset = batch_index * batch_size;
            let outcomes: Vec<Result<OptimizedRoute, DeliveryFailure>> = pool.install(|| {
                batch
                    .par_iter()
                    .enumerate()
                    .map(|(i, delivery)| self.optimize_one(offset + i, *delivery, cancel))
                    .collect()
            });

            for outcome in outcomes {
                match outcome {
                    Ok(route) => routes.push(route),
                    Err(DeliveryFailure::Cancelled) => return Err(OptimizeError::Cancelled),
                    Err(DeliveryFailure::UnknownCity { id, error }) => match self.options.unknown_city_policy {
                        UnknownCityPolicy::AbortRun => {
                            return Err(OptimizeError::UnknownCity {
                                delivery_id: id,
                                source: error,
                            });
                        }
                        UnknownCityPolicy::SkipDelivery => {
                            tracing::warn!(delivery = %id, error = %error, "skipping delivery");
                            skipped.push(SkippedDelivery {
                                id,
                                reason: error.to_string(),
                            });
                        }
                    },
                }
            }

            tracing::debug!(batch = batch_index + 1, batches, "batch resolved");
            observer.on_event(&OptimizationEvent::BatchCompleted {
                batch: batch_index + 1,
                batches,
            });
        }

        Ok(OptimizationResult::from_routes(routes, skipped))
    }

    fn optimize_one<D>(
        &self,
        index: usize,
        delivery: &D,
        cancel: &CancelToken,
    ) -> Result<OptimizedRoute, DeliveryFailure>
    where
        D: DeliveryRecord,
    {
        if cancel.is_cancelled() {
            return Err(DeliveryFailure::Cancelled);
        }

        let id = delivery
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("route-{}", index + 1));
        let origin_city = delivery.origin().unwrap_or(self.options.default_origin.as_str());
        let destination_city = delivery
            .destination()
            .unwrap_or(self.options.default_destination.as_str());

        let origin = self
            .registry
            .lookup(origin_city)
            .map_err(|error| DeliveryFailure::UnknownCity { id: id.clone(), error })?;
        let destination = self
            .registry
            .lookup(destination_city)
            .map_err(|error| DeliveryFailure::UnknownCity { id: id.clone(), error })?;

        let route = self.resolver.resolve(origin, destination);
        let original = route.duration_min;
        let factor = self.factor.factor(original);
        let (time_saved, optimized) =
            apply_factor(original, factor, self.options.min_optimized_duration_min);

        Ok(OptimizedRoute {
            id,
            origin: origin_city.to_string(),
            destination: destination_city.to_string(),
            vehicle: delivery
                .vehicle()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Véhicule {}", index + 1)),
            driver: delivery
                .driver()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Chauffeur {}", index + 1)),
            original_duration_min: original,
            optimized_duration_min: optimized,
            time_saved_min: time_saved,
            distance_km: route.distance_km,
            path: route.path,
            source: route.source,
        })
    }
}
