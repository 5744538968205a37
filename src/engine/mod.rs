//! Engine subsystem.
//!
//! # Data Flow
//! ```text
//! Setup (single writer):
//!     EngineBuilder::use_middleware / route / group
//!     → build() composes one chain per route
//!     → Engine (immutable, shared behind Arc)
//!
//! Per request:
//!     Engine::serve
//!     → ContextPool::acquire
//!     → Router::search (method, path)
//!     → chain driver (middleware..., handler) or 404
//!     → buffered response
//! ```
//!
//! # Design Decisions
//! - No registration after `build()`, so serving takes no locks on the route table
//! - Chains are composed once per route, not per request

pub mod builder;
pub mod dispatch;

pub use builder::{EngineBuilder, RouteGroup};
pub use dispatch::Engine;
