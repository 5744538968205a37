//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Check every semantic constraint and collect all failures.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        &mut errors,
        "listener.bind_address",
        &config.listener.bind_address,
    );
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero {
            field: "limits.max_body_size",
        });
    }

    if config.rate_limit.enabled {
        if config.rate_limit.requests_per_second == 0 {
            errors.push(ValidationError::Zero {
                field: "rate_limit.requests_per_second",
            });
        }
        if config.rate_limit.burst_size == 0 {
            errors.push(ValidationError::Zero {
                field: "rate_limit.burst_size",
            });
        }
        if config.rate_limit.idle_ttl_secs == 0 {
            errors.push(ValidationError::Zero {
                field: "rate_limit.idle_ttl_secs",
            });
        }
    }

    if config.locale.default_language.trim().is_empty() {
        errors.push(ValidationError::Invalid {
            field: "locale.default_language",
            message: "must not be empty".to_string(),
        });
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
