//! Request dispatch.
//!
//! # Responsibilities
//! - Check a context out of the pool for every request
//! - Resolve (method, path) through the router
//! - Answer unmatched requests with 404 without running any middleware
//! - Run the matched route's chain and convert the buffered response
//!
//! # Design Decisions
//! - `serve` is synchronous: the host buffers the body before calling it
//! - The context returns to the pool when the guard drops, on every path
//! - Aborted requests are complete as-is; no default response is added

use std::fmt;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, Request, Response, StatusCode};

use crate::chain::Chain;
use crate::config::PoolConfig;
use crate::context::ContextPool;
use crate::engine::builder::EngineBuilder;
use crate::observability::metrics;
use crate::routing::Router;

const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Frozen routing table plus context pool.
///
/// Read-only while serving; share it across request tasks behind an `Arc`.
pub struct Engine {
    router: Router<Chain>,
    pool: ContextPool,
}

impl Engine {
    pub fn builder(pool: PoolConfig) -> EngineBuilder {
        EngineBuilder::new(pool)
    }

    pub(crate) fn new(router: Router<Chain>, pool: ContextPool) -> Self {
        Self { router, pool }
    }

    /// Handle one request with a fully buffered body.
    pub fn serve(&self, request: Request<Bytes>) -> Response<Bytes> {
        let start = Instant::now();
        let method = request.method().clone();
        let mut ctx = self.pool.acquire(request);

        let route = match self.router.search(ctx.method(), ctx.path()) {
            Some(found) => {
                let route = found.pattern.clone();
                ctx.install(found.pattern, found.params, found.value.clone());
                ctx.run_chain();
                Some(route)
            }
            None => {
                tracing::debug!(method = %method, path = %ctx.path(), "No route matched");
                None
            }
        };

        let response = match route {
            Some(_) => ctx.take_response(),
            None => not_found(),
        };

        metrics::record_request(
            method.as_str(),
            response.status().as_u16(),
            route.as_deref().unwrap_or("none"),
            start,
        );
        response
    }

    /// Registered `METHOD-pattern` keys, sorted.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.router.routes().map(|(key, _)| key)
    }

    pub fn router(&self) -> &Router<Chain> {
        &self.router
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("routes", &self.router.len())
            .field("pool", &self.pool)
            .finish()
    }
}

fn not_found() -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(NOT_FOUND_BODY.as_bytes()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
