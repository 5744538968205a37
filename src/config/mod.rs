//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → sections handed to the engine builder, middleware and server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no global instance
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, LocaleConfig, ObservabilityConfig, PoolConfig,
    RateLimitConfig, ServerConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
