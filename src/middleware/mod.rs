//! Built-in middleware.
//!
//! # Responsibilities
//! - Recovery: panics downstream become a JSON 500
//! - Logger: one access log event per request
//! - RateLimiter: per-client token bucket, 429 over the limit
//! - Authenticate / Authorize: caller-supplied verifier and decision
//! - LocaleResolver: `Accept-Language` into the side-channel
//!
//! # Design Decisions
//! - Each one is a plain `Middleware` value; order is registration order
//! - Rejections write their response and abort instead of returning errors

pub mod auth;
pub mod locale;
pub mod logger;
pub mod rate_limit;
pub mod recovery;

pub use auth::{Authenticate, Authorize};
pub use locale::LocaleResolver;
pub use logger::Logger;
pub use rate_limit::RateLimiter;
pub use recovery::Recovery;
