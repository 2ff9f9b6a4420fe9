//! Token-bucket limiter guarding outbound routing requests.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::thread;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

pub type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Limiter allowing `per_second` requests on average with bursts of up to
/// `burst` back-to-back requests.
pub fn provider_limiter(per_second: NonZeroU32, burst: NonZeroU32) -> Limiter {
    let quota = Quota::per_second(per_second).allow_burst(burst);
    Arc::new(RateLimiter::direct(quota))
}

/// Blocks the calling thread until the limiter admits one request.
pub fn wait(limiter: &Limiter) {
    let clock = DefaultClock::default();
    while let Err(not_until) = limiter.check() {
        let delay = not_until.wait_time_from(clock.now());
        tracing::trace!(delay_ms = delay.as_millis() as u64, "rate limited");
        thread::sleep(delay);
    }
}
