//! Global request rate limiting.
//!
//! One token bucket (governor's GCRA) shared by every request, regardless of
//! client. Requests that find the bucket empty are rejected with 429 before
//! routing; nothing is queued.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::config::RateLimitConfig;
use crate::error::AppError;

pub struct RequestLimiter<C: Clock = DefaultClock> {
    limiter: RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<C::Instant>>,
    clock: C,
}

fn quota(config: &RateLimitConfig) -> anyhow::Result<Quota> {
    let rate = config.requests_per_second;
    if !rate.is_finite() || rate <= 0.0 {
        anyhow::bail!("rate limit must be positive, got {rate}");
    }
    let burst = NonZeroU32::new(config.burst)
        .ok_or_else(|| anyhow::anyhow!("rate burst must be at least 1"))?;
    let period = Duration::from_secs_f64(1.0 / rate);
    Quota::with_period(period)
        .map(|q| q.allow_burst(burst))
        .ok_or_else(|| anyhow::anyhow!("rate limit {rate}/s is too high to represent"))
}

impl RequestLimiter {
    pub fn new(config: &RateLimitConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, DefaultClock::default())
    }
}

impl<C: Clock> RequestLimiter<C> {
    pub fn with_clock(config: &RateLimitConfig, clock: C) -> anyhow::Result<Self> {
        let limiter = RateLimiter::direct_with_clock(quota(config)?, &clock);
        Ok(Self { limiter, clock })
    }

    /// Takes one token, or reports how long until one is available.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RequestLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match limiter.try_acquire() {
        Ok(()) => Ok(next.run(request).await),
        Err(wait) => {
            tracing::warn!(
                "Rate limit exceeded: {} {} (retry in {:?})",
                request.method(),
                request.uri().path(),
                wait
            );
            Err(AppError::TooManyRequests(wait.as_secs_f64().ceil() as u64))
        }
    }
}
