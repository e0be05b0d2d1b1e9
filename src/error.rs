//! # Error Types
//!
//! Structured errors for registration, listening and configuration.
//!
//! Dispatch misses are not errors: a malformed interactive line is an
//! expected occurrence and is reported as an [`Outcome`](crate::Outcome)
//! whose text goes to the logger sink.

use thiserror::Error;

/// Errors returned by [`CommandRegistry::register`](crate::CommandRegistry::register)
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The phrase is not a valid pattern
    #[error("invalid pattern {phrase:?}: {source}")]
    Pattern {
        phrase: String,
        #[source]
        source: regex::Error,
    },

    /// Fewer names than capture groups in the phrase
    #[error(
        "{phrase:?} has {expected} capture group(s) but only {provided} name(s) were supplied"
    )]
    Arity {
        phrase: String,
        expected: usize,
        provided: usize,
    },

    #[error("{phrase:?} was registered without any handler")]
    NoHandlers { phrase: String },
}

/// Errors returned by the execution controller
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("failed to read from line source: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("slot pool closed while waiting for capacity")]
    PoolClosed,
}

/// Errors produced while loading [`RegcmdConfig`](crate::config::RegcmdConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type RegistrationResult<T> = std::result::Result<T, RegistrationError>;
pub type ListenResult<T> = std::result::Result<T, ListenError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
