//! Session-level error types for directory calls.
//!
//! These errors describe what went wrong on the wire, independent of the credential
//! semantics layered above. The attribute accessor and the extended-operation codec convert
//! them into [`DirectoryError`](crate::DirectoryError).

use std::fmt;
use std::time::Duration;

/// Errors reported by a [`DirectorySession`](super::DirectorySession) implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The directory could not be reached (connection refused, closed, not bound).
    Unavailable { message: String },

    /// The directory did not answer in time.
    Timeout {
        operation: String,
        duration: Option<Duration>,
    },

    /// The directory answered with a non-success result code.
    Protocol { code: i32, message: String },

    /// A request or response could not be encoded or decoded.
    Encoding { message: String },
}

impl SessionError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn protocol(code: i32, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Unavailable { message } => {
                write!(f, "Directory unavailable: {}", message)
            }
            SessionError::Timeout {
                operation,
                duration,
            } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout during {} after {:?}", operation, duration)
                } else {
                    write!(f, "Timeout during {}", operation)
                }
            }
            SessionError::Protocol { code, message } => {
                if message.is_empty() {
                    write!(f, "Directory returned result code {}", code)
                } else {
                    write!(f, "Directory returned result code {}: {}", code, message)
                }
            }
            SessionError::Encoding { message } => {
                write!(f, "Encoding error: {}", message)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// LDAP result codes the session layer reports itself.
pub mod result_codes {
    pub const NO_SUCH_ATTRIBUTE: i32 = 16;
    pub const NO_SUCH_OBJECT: i32 = 32;
    pub const UNWILLING_TO_PERFORM: i32 = 53;
    pub const OTHER: i32 = 80;
}
