//! Switchyard: trie-routed HTTP request pipeline.
//!
//! Routes are registered on an [`EngineBuilder`], frozen into an [`Engine`],
//! and served through [`HttpServer`] or called directly with
//! [`Engine::serve`].

// Core subsystems
pub mod chain;
pub mod context;
pub mod engine;
pub mod routing;

// Built-in links
pub mod middleware;

// Hosting and cross-cutting concerns
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use chain::{from_fn, Middleware, Next};
pub use config::ServerConfig;
pub use context::{BindError, Context};
pub use engine::{Engine, EngineBuilder, RouteGroup};
pub use error::ServerError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
