//! Error types for the statement core
//!
//! Binding-time and state errors are returned synchronously at the call site.
//! Errors coming back from the [`Connection`](crate::connection::Connection)
//! are normalized into [`Error::Execution`] before they reach the caller.

use std::io;
use thiserror::Error;

use crate::constants::FieldType;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the statement core
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    // =========================================================================
    // Binding Errors
    // =========================================================================
    /// Argument outside of its accepted domain (negative fetch size, missing payload, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Textual value is not a valid literal of the declared field type
    #[error("cannot parse {input:?} as {field_type}: {reason}")]
    Parse {
        field_type: FieldType,
        input: String,
        reason: String,
    },

    // =========================================================================
    // State Errors
    // =========================================================================
    /// Operation not valid in the statement's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    // =========================================================================
    // Execution Errors
    // =========================================================================
    /// The database rejected the request or the transport failed
    #[error("execution failed{}: {}",
        .code.map(|c| format!(" (error {})", c)).unwrap_or_default(),
        .message)]
    Execution { code: Option<u32>, message: String },

    // =========================================================================
    // Wire Errors
    // =========================================================================
    /// Buffer underflow - not enough data to read
    #[error("buffer underflow: need {needed} bytes but only {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    /// Buffer overflow - request exceeds its size limit
    #[error("buffer overflow: need {needed} bytes but only {available} available")]
    BufferOverflow { needed: usize, available: usize },

    /// Invalid length indicator
    #[error("invalid length indicator: {0}")]
    InvalidLengthIndicator(u8),

    /// Unknown field type tag on the wire
    #[error("invalid field type: {0}")]
    InvalidFieldType(u8),

    /// Malformed request
    #[error("protocol error: {0}")]
    Protocol(String),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Underlying I/O error (raised by connection implementations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an execution error with an optional server error code
    pub fn execution(code: Option<u32>, message: impl Into<String>) -> Self {
        Error::Execution {
            code,
            message: message.into(),
        }
    }

    /// Create a parse error for a textual value
    pub fn parse(field_type: FieldType, input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parse {
            field_type,
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Normalize an error returned by a connection into an execution error
    pub(crate) fn into_execution(self) -> Self {
        match self {
            Error::Execution { .. } => self,
            other => Error::Execution {
                code: None,
                message: other.to_string(),
            },
        }
    }

    /// The server-supplied message of an execution error
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Execution { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Check if this is an execution error
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Error::Execution { .. })
    }

    /// Check if this is a state error
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }

    /// Check if this is a parse error
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display() {
        let err = Error::execution(Some(1062), "duplicate entry '42' for key 'PRIMARY'");
        assert_eq!(
            err.to_string(),
            "execution failed (error 1062): duplicate entry '42' for key 'PRIMARY'"
        );

        let err = Error::execution(None, "connection reset");
        assert_eq!(err.to_string(), "execution failed: connection reset");
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse(FieldType::Int, "abc", "invalid digit found in string");
        assert_eq!(
            err.to_string(),
            "cannot parse \"abc\" as INT: invalid digit found in string"
        );
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_into_execution_keeps_server_message() {
        let err = Error::execution(Some(7), "boom").into_execution();
        assert_eq!(err.server_message(), Some("boom"));

        let err = Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            .into_execution();
        assert!(err.is_execution_error());
        assert_eq!(err.server_message(), Some("I/O error: pipe closed"));
    }
}
