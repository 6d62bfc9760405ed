//! Error types for the application.
//!
//! This module provides the application's error hierarchy. The `Error` enum
//! serves as the top-level error type returned by startup, bot runs, and the
//! supervisor. API-level failures never appear here: the API client absorbs
//! them into its own [`ApiError`](crate::api::ApiError) channel so callers
//! get a value or no result, never a propagated fault.

use thiserror::Error;

use crate::api::ApiError;

/// Configuration error during startup or environment variable loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    ///
    /// The application requires this environment variable to be defined.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Top-level application error type.
///
/// Aggregates the error types that can end a bot run. Most variants use
/// `#[from]` for automatic conversion. The supervisor classifies these into
/// restart-with-delay or fatal outcomes, see
/// [`supervisor::classify`](crate::supervisor::classify).
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error during startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size.
    #[error(transparent)]
    Discord(#[from] Box<serenity::Error>),

    /// EDRP API client error that escaped to startup.
    ///
    /// Only produced while constructing the HTTP client; ordinary request
    /// failures stay inside the API client.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// I/O error, typically from logging setup.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Manual conversion from serenity::Error to Error.
///
/// Boxes the error to reduce the size of the Error enum, as serenity::Error
/// is very large and would make all Error variants larger if not boxed.
impl From<serenity::Error> for Error {
    fn from(err: serenity::Error) -> Self {
        Error::Discord(Box::new(err))
    }
}
