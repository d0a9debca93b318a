//! Error types for directory entry and credential operations.
//!
//! [`DirectoryError`] is the taxonomy seen by callers of the entry facade. Session
//! implementations report [`SessionError`](crate::session::SessionError) instead, which is
//! folded into this type at the attribute accessor and codec boundaries.

use crate::extended;
use crate::session::SessionError;

/// Main error type for directory entry operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// The directory could not be reached at all.
    #[error("Directory unavailable: {message}")]
    TransportUnavailable { message: String },

    /// A remote operation failed or returned a nonzero or malformed result.
    #[error("Directory operation failed: {message}")]
    Operation {
        /// Raw protocol code, when the directory reported one
        code: Option<i32>,
        message: String,
    },

    /// A password set, change or test was rejected.
    #[error("Password policy violation: {message}")]
    PasswordPolicyViolation {
        /// Raw protocol code, when the directory reported one
        code: Option<i32>,
        message: String,
    },

    /// The operation has no implementation under the current credential mode.
    #[error("Unsupported operation '{operation}': {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    /// A collaborator (policy resolver, challenge source) could not produce a valid result.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Validation failures signalled by collaborators.
///
/// The entry facade turns these into an absent result instead of propagating them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No password policy is assigned to the entry
    #[error("No password policy assigned to '{dn}'")]
    NoPolicyAssigned { dn: String },

    /// No challenge set is assigned to the entry
    #[error("No challenge set assigned to '{dn}'")]
    NoChallengeSet { dn: String },

    /// No stored responses exist for the entry
    #[error("No response set stored for '{dn}'")]
    NoResponseSet { dn: String },

    /// Stored data could not be interpreted
    #[error("Malformed {what}: {message}")]
    Malformed { what: String, message: String },
}

// Convenience constructors
impl DirectoryError {
    /// Create an operation error without a protocol code
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            code: None,
            message: message.into(),
        }
    }

    /// Create an operation error carrying a protocol code
    pub fn operation_code(code: i32, message: impl Into<String>) -> Self {
        Self::Operation {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Create a policy violation from a nonzero extended-operation return code
    pub fn policy_violation_code(code: i32) -> Self {
        Self::PasswordPolicyViolation {
            code: Some(code),
            message: extended::describe_code(code),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Re-raise a failed password write or compare as a policy violation.
    ///
    /// `TransportUnavailable` is returned unchanged; it is never masked as a policy outcome.
    pub fn into_policy_violation(self) -> Self {
        match self {
            Self::TransportUnavailable { .. } | Self::PasswordPolicyViolation { .. } => self,
            Self::Operation { code, message } => Self::PasswordPolicyViolation { code, message },
            other => Self::PasswordPolicyViolation {
                code: None,
                message: other.to_string(),
            },
        }
    }

    /// The raw protocol code attached to this error, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Operation { code, .. } | Self::PasswordPolicyViolation { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_transport_unavailable(&self) -> bool {
        matches!(self, Self::TransportUnavailable { .. })
    }
}

impl From<SessionError> for DirectoryError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Unavailable { message } => Self::TransportUnavailable { message },
            SessionError::Protocol { code, message } => Self::Operation {
                code: Some(code),
                message,
            },
            other => Self::operation(other.to_string()),
        }
    }
}

impl ValidationError {
    /// Create a malformed-data error
    pub fn malformed(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            what: what.into(),
            message: message.into(),
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
