//! Route and middleware registration.
//!
//! # Responsibilities
//! - Collect global middleware, route groups and routes during setup
//! - Compose each route's chain once: global ++ group ++ [handler]
//! - Freeze everything into an immutable `Engine`
//!
//! # Design Decisions
//! - Global middleware apply to every route, whenever they were registered
//! - Group middleware apply to routes registered through the group after
//!   the `use_middleware` call
//! - Later registrations of the same `(method, pattern)` replace earlier ones

use std::sync::Arc;

use axum::http::Method;

use crate::chain::{Chain, Endpoint, Middleware};
use crate::config::PoolConfig;
use crate::context::{Context, ContextPool};
use crate::engine::dispatch::Engine;
use crate::routing::Router;

struct RouteDef {
    method: Method,
    pattern: String,
    middleware: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn Middleware>,
}

/// Setup-phase registrar for an [`Engine`].
pub struct EngineBuilder {
    pool: PoolConfig,
    middleware: Vec<Arc<dyn Middleware>>,
    routes: Vec<RouteDef>,
}

macro_rules! method_helpers {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($method), "` route.")]
            pub fn $name<H>(&mut self, pattern: &str, handler: H) -> &mut Self
            where
                H: Fn(&mut Context) + Send + Sync + 'static,
            {
                self.route(Method::$method, pattern, handler)
            }
        )*
    };
}

impl EngineBuilder {
    pub fn new(pool: PoolConfig) -> Self {
        Self {
            pool,
            middleware: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Append middleware to the global chain.
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Register `handler` for `(method, pattern)`.
    pub fn route<H>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.push_route(method, pattern.to_string(), Vec::new(), Arc::new(Endpoint(handler)));
        self
    }

    method_helpers! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }

    /// Open a group whose routes share `prefix` and group middleware.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            builder: self,
            prefix: prefix.to_string(),
            middleware: Vec::new(),
        }
    }

    fn push_route(
        &mut self,
        method: Method,
        pattern: String,
        middleware: Vec<Arc<dyn Middleware>>,
        handler: Arc<dyn Middleware>,
    ) {
        self.routes.push(RouteDef {
            method,
            pattern,
            middleware,
            handler,
        });
    }

    /// Freeze registration into a servable engine.
    pub fn build(self) -> Engine {
        let mut router: Router<Chain> = Router::new();
        for route in self.routes {
            let links: Vec<Arc<dyn Middleware>> = self
                .middleware
                .iter()
                .chain(route.middleware.iter())
                .cloned()
                .chain(std::iter::once(route.handler))
                .collect();
            router.insert(route.method, &route.pattern, Chain::from(links));
        }

        for (key, chain) in router.routes() {
            tracing::debug!(route = %key, links = chain.len(), "Route registered");
        }
        tracing::info!(
            routes = router.len(),
            global_middleware = self.middleware.len(),
            "Engine built"
        );

        Engine::new(router, ContextPool::from_config(&self.pool))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

/// Registrar for routes sharing a path prefix and group middleware.
pub struct RouteGroup<'b> {
    builder: &'b mut EngineBuilder,
    prefix: String,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl RouteGroup<'_> {
    /// Append middleware for routes registered through this group from now on.
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn route<H>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        let pattern = format!("{}{}", self.prefix, pattern);
        self.builder.push_route(
            method,
            pattern,
            self.middleware.clone(),
            Arc::new(Endpoint(handler)),
        );
        self
    }

    method_helpers! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }

    /// Nested group: prefixes concatenate and current group middleware carry over.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            prefix: format!("{}{}", self.prefix, prefix),
            middleware: self.middleware.clone(),
            builder: &mut *self.builder,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
