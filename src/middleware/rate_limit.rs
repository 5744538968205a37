//! Per-client token bucket rate limiting.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use dashmap::DashMap;

use crate::chain::{Middleware, Next};
use crate::config::RateLimitConfig;
use crate::context::Context;
use crate::observability::metrics;

/// Burst size and refill speed shared by every client bucket.
#[derive(Debug, Clone, Copy)]
struct Quota {
    burst: f64,
    per_second: f64,
}

impl Quota {
    /// Time for an empty bucket to fill up again.
    fn refill_time(&self) -> Duration {
        if self.per_second > 0.0 {
            Duration::from_secs_f64(self.burst / self.per_second)
        } else {
            Duration::MAX
        }
    }
}

/// Tokens left for one client, as of `refreshed`.
#[derive(Debug)]
struct Bucket {
    available: f64,
    refreshed: Instant,
}

impl Bucket {
    fn full(quota: &Quota, now: Instant) -> Self {
        Self {
            available: quota.burst,
            refreshed: now,
        }
    }

    fn level(&self, quota: &Quota, now: Instant) -> f64 {
        let idle = now.saturating_duration_since(self.refreshed);
        let earned = idle.as_secs_f64() * quota.per_second;
        (self.available + earned).min(quota.burst)
    }

    fn take(&mut self, quota: &Quota, now: Instant) -> bool {
        self.available = self.level(quota, now);
        self.refreshed = now;
        let granted = self.available >= 1.0;
        if granted {
            self.available -= 1.0;
        }
        granted
    }

    /// Unused for at least `idle_ttl` and refilled, so dropping it loses nothing.
    fn is_reclaimable(&self, quota: &Quota, now: Instant, idle_ttl: Duration) -> bool {
        now.saturating_duration_since(self.refreshed) >= idle_ttl
            && self.level(quota, now) >= quota.burst
    }
}

/// Rejects clients that exceed their bucket with `429` and aborts the chain.
///
/// Requests without a known peer address share one bucket. Buckets idle for
/// longer than the idle TTL are swept at most once per TTL.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<IpAddr, Bucket>,
    quota: Quota,
    idle_ttl: Duration,
    started: Instant,
    last_sweep_ms: AtomicU64,
}

impl RateLimiter {
    pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60);

    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            quota: Quota {
                burst: f64::from(burst_size.max(1)),
                per_second: f64::from(requests_per_second),
            },
            idle_ttl: Self::DEFAULT_IDLE_TTL,
            started: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
            .with_idle_ttl(Duration::from_secs(config.idle_ttl_secs))
    }

    /// Forget clients idle for `idle_ttl` once their bucket has refilled.
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    fn check(&self, key: IpAddr) -> bool {
        let now = Instant::now();
        self.sweep_if_due(now);
        self.buckets
            .entry(key)
            .or_insert_with(|| Bucket::full(&self.quota, now))
            .take(&self.quota, now)
    }

    fn sweep_if_due(&self, now: Instant) {
        let elapsed = millis(now.saturating_duration_since(self.started));
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if elapsed.saturating_sub(last) < millis(self.idle_ttl) {
            return;
        }
        // One caller per interval does the sweep.
        if self
            .last_sweep_ms
            .compare_exchange(last, elapsed, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| !bucket.is_reclaimable(&self.quota, now, self.idle_ttl));
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            tracing::debug!(
                evicted,
                tracked = self.buckets.len(),
                refill = ?self.quota.refill_time(),
                "Idle rate limit buckets evicted"
            );
        }
    }

    /// Clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Middleware for RateLimiter {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        let key = ctx
            .client_ip()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        if self.check(key) {
            next.run(ctx);
        } else {
            tracing::warn!(client = %key, path = %ctx.path(), "Rate limit exceeded");
            metrics::record_rate_limited("rps_limit");
            ctx.string(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded");
            ctx.abort();
        }
    }
}
