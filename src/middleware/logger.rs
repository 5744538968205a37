//! Access logging.

use std::time::Instant;

use crate::chain::{Middleware, Next};
use crate::context::Context;
use crate::http::X_REQUEST_ID;

/// Emits one `info` event per request after the rest of the chain ran.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Middleware for Logger {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        let start = Instant::now();
        next.run(ctx);

        let latency = start.elapsed();
        let target = match ctx.request().uri().query() {
            Some(query) => format!("{}?{}", ctx.path(), query),
            None => ctx.path().to_string(),
        };
        let client_ip = ctx
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());

        tracing::info!(
            client_ip = %client_ip,
            method = %ctx.method(),
            path = %target,
            status = ctx.status_code().as_u16(),
            latency = ?latency,
            route = ctx.route_pattern().unwrap_or("none"),
            request_id = ctx.header(X_REQUEST_ID).unwrap_or("-"),
            aborted = ctx.is_aborted(),
            "Request completed"
        );
    }
}
