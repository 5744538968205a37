//! Chain links: middleware and route handlers.

use std::sync::Arc;

use crate::chain::next::Next;
use crate::context::Context;

/// A link in the request chain.
///
/// Code placed before `next.run(ctx)` runs before downstream links, code
/// after it runs once they have finished. A link that never calls `next`
/// lets the chain continue with the following link after it returns,
/// unless it called [`Context::abort`].
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, ctx: &mut Context, next: Next<'_>);
}

impl<F> Middleware for F
where
    F: Fn(&mut Context, Next<'_>) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        self(ctx, next)
    }
}

/// Shared, ordered links for one route: global, then group, then handler.
pub type Chain = Arc<[Arc<dyn Middleware>]>;

/// Middleware built from a closure.
pub struct FromFn<F>(F);

/// Wrap a closure as middleware.
///
/// ```rust,ignore
/// app.use_middleware(from_fn(|ctx, next| {
///     ctx.set(Locale("en".into()));
///     next.run(ctx);
/// }));
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Context, Next<'_>) + Send + Sync + 'static,
{
    FromFn(f)
}

impl<F> Middleware for FromFn<F>
where
    F: Fn(&mut Context, Next<'_>) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        (self.0)(ctx, next)
    }
}

/// Route handler placed at the end of a chain.
pub(crate) struct Endpoint<H>(pub(crate) H);

impl<H> Middleware for Endpoint<H>
where
    H: Fn(&mut Context) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context, _next: Next<'_>) {
        (self.0)(ctx)
    }
}
