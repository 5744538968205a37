//! Middleware chain execution.
//!
//! # Data Flow
//! ```text
//! Engine::serve
//!     → next::run(chain, ctx)
//!         → link[0].handle(ctx, Next { rest: link[1..] })
//!             → next.run(ctx)      (optional: wraps downstream)
//!                 → link[1].handle(...)
//!         → link[1] ... when link[0] returned without resuming
//!     → stop at end of chain or once ctx.abort() was called
//! ```
//!
//! # Design Decisions
//! - Continuation passing instead of a shared cursor: the before/after split
//!   around `next.run` is visible in the code of each link
//! - Links are synchronous; nothing in the chain yields to other requests
//! - Abort is a flag on the context, checked before every link

pub mod middleware;
pub mod next;

pub use middleware::{from_fn, Chain, FromFn, Middleware};
pub(crate) use middleware::Endpoint;
pub use next::Next;
