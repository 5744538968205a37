//! Context reuse pool.
//!
//! # Responsibilities
//! - Hand out a `Context` owned by exactly one request at a time
//! - Take contexts back when the request is done and scrub them
//! - Bound the number of idle contexts kept around
//!
//! # Design Decisions
//! - Checkout is an RAII guard: the context goes back on drop, on every
//!   return path of the caller
//! - A context dropped while its thread is panicking is discarded, not
//!   pooled, since the chain left it mid-write
//! - Returned contexts are reset immediately so idle entries hold no
//!   request data

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use axum::body::Bytes;
use axum::http::Request;

use crate::config::PoolConfig;
use crate::context::Context;
use crate::observability::metrics;

/// Pool of idle request contexts.
#[derive(Debug)]
pub struct ContextPool {
    idle: Mutex<Vec<Context>>,
    max_idle: usize,
}

impl ContextPool {
    /// Create a pool that keeps at most `max_idle` contexts.
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(max_idle.min(64))),
            max_idle,
        }
    }

    /// Create a pool from configuration, pre-allocating `prewarm` contexts.
    pub fn from_config(config: &PoolConfig) -> Self {
        let pool = Self::new(config.max_idle);
        {
            let mut idle = pool.lock();
            let count = config.prewarm.min(config.max_idle);
            idle.extend((0..count).map(|_| Context::default()));
        }
        pool
    }

    /// Check out a context reset for `request`.
    pub fn acquire(&self, request: Request<Bytes>) -> PooledContext<'_> {
        let reused = self.lock().pop();
        metrics::record_pool_checkout(reused.is_some());
        let mut ctx = reused.unwrap_or_default();
        ctx.reset(request);
        PooledContext { pool: self, ctx }
    }

    /// Contexts currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    fn release(&self, mut ctx: Context) {
        if thread::panicking() {
            return;
        }
        ctx.reset(Request::default());
        let mut idle = self.lock();
        if idle.len() < self.max_idle {
            idle.push(ctx);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Context>> {
        // Pool entries are reset on release, so a poisoned lock holds nothing stale.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A context checked out of a [`ContextPool`], returned on drop.
#[derive(Debug)]
pub struct PooledContext<'p> {
    pool: &'p ContextPool,
    ctx: Context,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ctx
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        let ctx = std::mem::take(&mut self.ctx);
        self.pool.release(ctx);
    }
}
