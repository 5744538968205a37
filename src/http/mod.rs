//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout, trace)
//!     → request.rs (add request ID)
//!     → server.rs dispatch (buffer body, ConnectInfo kept in extensions)
//!     → Engine::serve (routing, chain, buffered response)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdGenerator, X_REQUEST_ID};
pub use server::{bind, AppState, HttpServer};
