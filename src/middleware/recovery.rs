//! Panic recovery.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use axum::http::StatusCode;
use serde_json::json;

use crate::chain::{Middleware, Next};
use crate::context::Context;

/// Turns a panic anywhere downstream into a JSON 500 and aborts the chain.
///
/// Register it first so it wraps every other link.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

impl Middleware for Recovery {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| next.run(ctx)));
        if let Err(payload) = outcome {
            tracing::error!(
                method = %ctx.method(),
                path = %ctx.path(),
                route = ctx.route_pattern().unwrap_or("none"),
                panic = %panic_message(payload.as_ref()),
                "Panic recovered"
            );
            ctx.discard_response();
            ctx.json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "error": "Internal server error" }),
            );
            ctx.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::engine::Engine;
    use axum::body::Bytes;
    use axum::http::Request;

    fn get(path: &str) -> Request<Bytes> {
        Request::builder().uri(path).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_panic_becomes_json_500() {
        let mut app = Engine::builder(PoolConfig::default());
        app.use_middleware(Recovery);
        app.get("/panic", |ctx: &mut Context| {
            ctx.string(StatusCode::OK, "half written");
            panic!("boom");
        });
        let engine = app.build();

        let response = engine.serve(get("/panic"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body().as_ref(),
            br#"{"error":"Internal server error"}"#
        );
    }

    #[test]
    fn test_recovered_context_goes_back_to_pool() {
        let mut app = Engine::builder(PoolConfig::default());
        app.use_middleware(Recovery);
        app.get("/panic", |_ctx: &mut Context| panic!("boom"));
        let engine = app.build();

        engine.serve(get("/panic"));
        assert_eq!(engine.pool().idle(), 1);
    }

    #[test]
    fn test_no_panic_passes_through() {
        let mut app = Engine::builder(PoolConfig::default());
        app.use_middleware(Recovery);
        app.get("/ok", |ctx: &mut Context| ctx.string(StatusCode::CREATED, "fine"));
        let engine = app.build();

        let response = engine.serve(get("/ok"));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_ref(), b"fine");
    }

    #[test]
    fn test_panic_message_from_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
