//! Error types for the CLI

use doppel_gen::GenError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Generation failed
    #[error(transparent)]
    Gen(#[from] GenError),

    /// Writing to stdout failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid invocation
    #[error("{message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Failure already reported to the user; exits 1 without a diagnostic
    #[error("")]
    Silent,
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether a diagnostic should be printed for this error.
    #[must_use]
    pub fn has_message(&self) -> bool {
        !self.to_string().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_error_is_transparent() {
        let err: CliError = GenError::lookup("Widget").into();
        assert_eq!(err.to_string(), "bad type: Widget");
        assert!(err.has_message());
    }

    #[test]
    fn test_silent_has_no_message() {
        assert!(!CliError::Silent.has_message());
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad type: no type provided");
        assert_eq!(err.to_string(), "bad type: no type provided");
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
