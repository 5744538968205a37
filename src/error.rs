//! Crate-level error types.

use std::io;

/// Failures of the HTTP host.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}
