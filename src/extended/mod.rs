//! NMAS credential extended operations.
//!
//! The credential protocol has four request shapes, modelled as the closed
//! [`CredentialRequest`] variant. The [`codec`] module maps them to and from the BER values
//! carried by LDAP extended operations; everything vendor-specific about the wire format
//! lives there, so the dispatcher only ever sees [`CredentialRequest`] and
//! [`CredentialResponse`].
//!
//! A round trip is `encode` → [`invoke`] → `decode`:
//!
//! ```rust
//! use ldap_credentials::extended::{self, codec, CredentialRequest};
//! use ldap_credentials::session::InMemoryDirectory;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new();
//! directory.add_entry("cn=alice,o=org", [("userPassword", "secret")]).await;
//!
//! let request = CredentialRequest::Get { dn: "cn=alice,o=org".to_string() };
//! let raw = codec::encode(&request)?;
//! let response = extended::invoke(&directory, raw).await?;
//! let decoded = match response {
//!     Some(response) => codec::decode(request.operation(), &response)?,
//!     None => None,
//! };
//! assert_eq!(decoded.and_then(|r| r.password), Some("secret".to_string()));
//! # Ok(())
//! # }
//! ```

pub mod codec;

use log::trace;
use std::fmt;

use crate::error::DirectoryResult;
use crate::session::{DirectorySession, ExtendedRequest, ExtendedResponse};

/// OID arc shared by all NMAS LDAP extensions.
pub const NMAS_OID_ARC: &str = "2.16.840.1.113719.1.39.42.100";

/// The kind of a credential extended operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialOperation {
    PolicyCheck,
    Get,
    Set,
    Change,
}

impl CredentialOperation {
    pub const ALL: [CredentialOperation; 4] = [
        CredentialOperation::PolicyCheck,
        CredentialOperation::Get,
        CredentialOperation::Set,
        CredentialOperation::Change,
    ];

    fn request_suffix(self) -> u32 {
        match self {
            CredentialOperation::Set => 11,
            CredentialOperation::Get => 13,
            CredentialOperation::PolicyCheck => 17,
            CredentialOperation::Change => 21,
        }
    }

    /// OID of the request message.
    pub fn request_oid(self) -> String {
        format!("{}.{}", NMAS_OID_ARC, self.request_suffix())
    }

    /// OID of the response message.
    pub fn response_oid(self) -> String {
        format!("{}.{}", NMAS_OID_ARC, self.request_suffix() + 1)
    }

    /// Identify an operation from its request OID.
    pub fn from_request_oid(oid: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.request_oid() == oid)
    }

    pub fn name(self) -> &'static str {
        match self {
            CredentialOperation::PolicyCheck => "password policy check",
            CredentialOperation::Get => "get password",
            CredentialOperation::Set => "set password",
            CredentialOperation::Change => "change password",
        }
    }
}

impl fmt::Display for CredentialOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A credential request addressed to one entry.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialRequest {
    /// Ask the server whether `password` satisfies the entry's policy, without setting it.
    PolicyCheck { dn: String, password: String },
    /// Retrieve the entry's current password.
    Get { dn: String },
    /// Administratively set the password.
    Set { dn: String, password: String },
    /// Change the password; the server verifies `old_password` first.
    Change {
        dn: String,
        old_password: String,
        new_password: String,
    },
}

impl CredentialRequest {
    pub fn operation(&self) -> CredentialOperation {
        match self {
            CredentialRequest::PolicyCheck { .. } => CredentialOperation::PolicyCheck,
            CredentialRequest::Get { .. } => CredentialOperation::Get,
            CredentialRequest::Set { .. } => CredentialOperation::Set,
            CredentialRequest::Change { .. } => CredentialOperation::Change,
        }
    }

    /// The target entry.
    pub fn dn(&self) -> &str {
        match self {
            CredentialRequest::PolicyCheck { dn, .. }
            | CredentialRequest::Get { dn }
            | CredentialRequest::Set { dn, .. }
            | CredentialRequest::Change { dn, .. } => dn,
        }
    }
}

// Passwords never reach logs through Debug.
impl fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("operation", &self.operation())
            .field("dn", &self.dn())
            .finish_non_exhaustive()
    }
}

/// Decoded response to a credential request.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialResponse {
    /// Server return code; 0 is success.
    pub code: i32,
    /// The password, for [`CredentialOperation::Get`] only.
    pub password: Option<String>,
}

impl CredentialResponse {
    pub fn success() -> Self {
        Self {
            code: codes::SUCCESS,
            password: None,
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            code,
            password: None,
        }
    }

    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            code: codes::SUCCESS,
            password: Some(password.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }
}

impl fmt::Debug for CredentialResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResponse")
            .field("code", &self.code)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

/// Return codes with a known meaning.
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const DUPLICATE_PASSWORD: i32 = -215;
    pub const PASSWORD_TOO_SHORT: i32 = -216;
    pub const PASSWORD_EXPIRED: i32 = -222;
    pub const FAILED_AUTHENTICATION: i32 = -669;
    pub const NO_PASSWORD: i32 = -1602;
}

/// Human-readable description of a return code.
pub fn describe_code(code: i32) -> String {
    let meaning = match code {
        codes::SUCCESS => "success",
        codes::DUPLICATE_PASSWORD => "password was used previously",
        codes::PASSWORD_TOO_SHORT => "password too short",
        codes::PASSWORD_EXPIRED => "password expired",
        codes::FAILED_AUTHENTICATION => "failed authentication",
        codes::NO_PASSWORD => "no password stored for entry",
        _ => return format!("error {}", code),
    };
    format!("{} (error {})", meaning, code)
}

/// Send an encoded request through the session.
///
/// Session failures come back as [`DirectoryError`](crate::DirectoryError); `Ok(None)` is a
/// null response.
pub async fn invoke<S: DirectorySession>(
    session: &S,
    request: ExtendedRequest,
) -> DirectoryResult<Option<ExtendedResponse>> {
    trace!("Invoking extended operation {}", request.oid);
    let response = session.extended_operation(request).await?;
    Ok(response.filter(|r| r.value.is_some()))
}

/// Encode, invoke and decode in one step.
pub async fn exchange<S: DirectorySession>(
    session: &S,
    request: &CredentialRequest,
) -> DirectoryResult<Option<CredentialResponse>> {
    let raw = codec::encode(request)?;
    match invoke(session, raw).await? {
        Some(response) => codec::decode(request.operation(), &response),
        None => Ok(None),
    }
}
