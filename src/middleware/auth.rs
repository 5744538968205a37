//! Bearer-token authentication and pluggable authorization.
//!
//! Token verification and the authorization decision are supplied by the
//! caller; these links only move their results through the context.

use std::marker::PhantomData;

use axum::http::StatusCode;
use serde_json::json;

use crate::chain::{Middleware, Next};
use crate::context::{AuthDecision, Context};

const BEARER: &str = "bearer";

/// Verifies `Authorization: Bearer <token>` and stores the claims it yields.
///
/// Missing, malformed or rejected tokens get `401` and abort the chain.
pub struct Authenticate<V, C> {
    verify: V,
    _claims: PhantomData<fn() -> C>,
}

impl<V, C> Authenticate<V, C>
where
    V: Fn(&str) -> Option<C> + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    pub fn new(verify: V) -> Self {
        Self {
            verify,
            _claims: PhantomData,
        }
    }
}

impl<V, C> Middleware for Authenticate<V, C>
where
    V: Fn(&str) -> Option<C> + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        let claims = ctx
            .header("authorization")
            .and_then(bearer_token)
            .and_then(&self.verify);
        match claims {
            Some(claims) => {
                ctx.set(claims);
                next.run(ctx);
            }
            None => {
                tracing::debug!(path = %ctx.path(), "Authentication failed");
                ctx.json(StatusCode::UNAUTHORIZED, &json!({ "error": "Unauthorized" }));
                ctx.abort();
            }
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty()).then_some(token)
}

/// Stores an [`AuthDecision`] from a caller-supplied predicate; `false` gets `403`.
pub struct Authorize<D> {
    decide: D,
}

impl<D> Authorize<D>
where
    D: Fn(&Context) -> bool + Send + Sync + 'static,
{
    pub fn new(decide: D) -> Self {
        Self { decide }
    }
}

impl<D> Middleware for Authorize<D>
where
    D: Fn(&Context) -> bool + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        let decision = AuthDecision::from((self.decide)(ctx));
        ctx.set(decision);
        if decision.is_allowed() {
            next.run(ctx);
        } else {
            ctx.json(StatusCode::FORBIDDEN, &json!({ "error": "Forbidden" }));
            ctx.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::engine::Engine;
    use axum::body::Bytes;
    use axum::http::{header, Request};

    #[derive(Debug, Clone, PartialEq)]
    struct Claims {
        user: String,
        admin: bool,
    }

    fn verify(token: &str) -> Option<Claims> {
        match token {
            "alice-token" => Some(Claims { user: "alice".into(), admin: true }),
            "bob-token" => Some(Claims { user: "bob".into(), admin: false }),
            _ => None,
        }
    }

    fn engine() -> Engine {
        let mut app = Engine::builder(PoolConfig::default());
        app.use_middleware(Authenticate::new(verify));
        app.use_middleware(Authorize::new(|ctx: &Context| {
            ctx.get::<Claims>().is_some_and(|claims| claims.admin)
        }));
        app.get("/admin", |ctx: &mut Context| {
            let user = ctx.get::<Claims>().map(|c| c.user.clone()).unwrap_or_default();
            let allowed = ctx.get::<AuthDecision>().copied();
            assert_eq!(allowed, Some(AuthDecision::Allowed));
            ctx.string(StatusCode::OK, user);
        });
        app.build()
    }

    fn with_auth(value: Option<&str>) -> Request<Bytes> {
        let mut builder = Request::builder().uri("/admin");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_valid_token_reaches_handler() {
        let response = engine().serve(with_auth(Some("Bearer alice-token")));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"alice");
    }

    #[test]
    fn test_missing_or_bad_token_is_401() {
        let engine = engine();
        for value in [None, Some("Bearer nope"), Some("Basic alice-token"), Some("Bearer ")] {
            let response = engine.serve(with_auth(value));
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{:?}", value);
        }
    }

    #[test]
    fn test_denied_decision_is_403() {
        let response = engine().serve(with_auth(Some("Bearer bob-token")));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body().as_ref(), br#"{"error":"Forbidden"}"#);
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Token abc"), None);
    }
}
