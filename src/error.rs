//! Error types for Vanilla operations.
//!
//! This module defines [`VanillaError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `VanillaError` for errors the host or a step needs to handle distinctly
//! - Use `anyhow::Error` (via `VanillaError::Other`) for unexpected errors
//! - Failures raised by a build step never surface here: the step runner
//!   records them on the build instead

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Vanilla operations.
#[derive(Debug, Error)]
pub enum VanillaError {
    /// Malformed input to a context operation (e.g. an empty parameter name).
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Pipeline definition not found at the given location.
    #[error("Pipeline definition not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a pipeline definition.
    #[error("Failed to parse pipeline at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid pipeline structure or values.
    #[error("Invalid pipeline: {message}")]
    ConfigValidationError { message: String },

    /// A `${name}` reference has no matching parameter.
    #[error("Unknown parameter in interpolation: {variable}")]
    Interpolation { variable: String },

    /// Shell command could not be started.
    #[error("Failed to start `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Vanilla operations.
pub type Result<T> = std::result::Result<T, VanillaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_displays_message() {
        let err = VanillaError::InvalidArgument {
            message: "parameter name must not be empty".into(),
        };
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = VanillaError::ConfigParseError {
            path: PathBuf::from("/pipeline.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/pipeline.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn interpolation_displays_variable() {
        let err = VanillaError::Interpolation {
            variable: "version".into(),
        };
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn command_spawn_keeps_io_cause() {
        let err = VanillaError::CommandSpawn {
            command: "make test".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("make test"));
        assert!(msg.contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: VanillaError = io_err.into();
        assert!(matches!(err, VanillaError::Io(_)));
    }

    #[test]
    fn anyhow_error_converts() {
        let err: VanillaError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, VanillaError::Other(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
