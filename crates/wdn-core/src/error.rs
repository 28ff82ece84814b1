//! Unified error types for the WDN ecosystem
//!
//! This module provides a common error type [`WdnError`] that can represent
//! errors from any part of the system. Domain-specific error types can be
//! converted to `WdnError` for uniform error handling at API boundaries.

use thiserror::Error;

/// Unified error type for all WDN operations.
///
/// Allows errors from I/O, parsing, hydraulic solving, and validation to be
/// handled uniformly at API boundaries.
#[derive(Error, Debug)]
pub enum WdnError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Hydraulic solver errors (non-convergence, singular systems)
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network structure errors
    #[error("Network error: {0}")]
    Network(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using WdnError.
pub type WdnResult<T> = Result<T, WdnError>;

impl From<anyhow::Error> for WdnError {
    fn from(err: anyhow::Error) -> Self {
        WdnError::Other(err.to_string())
    }
}

impl From<String> for WdnError {
    fn from(s: String) -> Self {
        WdnError::Other(s)
    }
}

impl From<&str> for WdnError {
    fn from(s: &str) -> Self {
        WdnError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WdnError::Solver("hydraulics did not converge".into());
        assert!(err.to_string().contains("Solver error"));
        assert!(err.to_string().contains("did not converge"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let wdn_err: WdnError = io_err.into();
        assert!(matches!(wdn_err, WdnError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> WdnResult<()> {
            Err(WdnError::Validation("test".into()))
        }

        fn outer() -> WdnResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
