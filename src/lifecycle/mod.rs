//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber (server, background tasks) stops
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!     HttpServer → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; tests trigger it directly instead of sending signals
//! - In-flight requests finish before `run` returns

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{shutdown_signal, spawn_signal_listener};
