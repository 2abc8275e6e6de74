//! Error types for the demo server
//!
//! The caching decision core itself is total: every policy evaluator accepts
//! any token or header string and never fails. Errors here cover only the
//! serving layer (configuration, socket bind, server loop), all of which are
//! fatal at startup.

use std::io;

use thiserror::Error;

/// Result type alias for the demo server
pub type Result<T> = std::result::Result<T, Error>;

/// Demo server errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
