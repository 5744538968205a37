//! Request context subsystem.
//!
//! # Data Flow
//! ```text
//! Engine::serve
//!     → pool.rs (check out a Context, reset for this request)
//!     → request_context.rs (params, route, chain installed by the engine)
//!     → chain links read the request, share typed values, write the response
//!     → response.rs (buffer converted into http::Response)
//!     → pool.rs (guard dropped: context scrubbed and returned)
//! ```
//!
//! # Design Decisions
//! - One context per in-flight request, never shared between threads
//! - Side-channel keyed by type, so reads are checked and absence is `None`
//! - Binding errors go back to the handler; the core never picks a status for them

pub mod bind;
pub mod keys;
pub mod pool;
pub mod request_context;
pub mod response;

pub use bind::{BindError, BodyFormat};
pub use keys::{AuthDecision, Locale};
pub use pool::{ContextPool, PooledContext};
pub use request_context::Context;
pub use response::ResponseBuffer;
