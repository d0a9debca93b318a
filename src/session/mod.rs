//! Directory session abstraction.
//!
//! A [`DirectorySession`] is the capability the credential core consumes: attribute reads,
//! writes and compares against a named entry, raw extended operations, and the session-wide
//! configuration that decides the credential mode. Connecting and binding are the caller's
//! business; a session is handed over already authenticated.
//!
//! Two implementations ship with the crate:
//!
//! - [`InMemoryDirectory`] keeps entries in memory and emulates the vendor credential
//!   extensions, for tests and development.
//! - [`LdapSession`] forwards every call to an `ldap3` connection.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_credentials::session::{DirectorySession, InMemoryDirectory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new();
//! directory.add_entry("cn=alice,o=org", [("givenName", "Alice")]).await;
//!
//! let name = directory.read_attribute("cn=alice,o=org", "givenName").await?;
//! assert_eq!(name.as_deref(), Some("Alice"));
//!
//! directory.write_attribute("cn=alice,o=org", "givenName", "Alicia").await?;
//! assert!(directory.compare_attribute("cn=alice,o=org", "givenName", "Alicia").await?);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;
pub mod ldap;


pub use errors::SessionError;
pub use in_memory::{InMemoryDirectory, PasswordRules, ScriptedResponse};
pub use ldap::LdapSession;

use std::collections::HashMap;
use std::future::Future;

use crate::config::SharedConfig;

/// A raw extended-operation request: the request OID and its encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRequest {
    pub oid: String,
    pub value: Option<Vec<u8>>,
}

/// A raw extended-operation response.
///
/// A response whose `value` is `None` carries no payload; the credential codec calls this a
/// null response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtendedResponse {
    pub oid: Option<String>,
    pub value: Option<Vec<u8>>,
}

/// Core trait for sessions against a directory service.
///
/// Every method is one remote round trip. Implementations must not cache: the credential
/// core relies on reads reflecting the latest write, and on configuration being re-read
/// for every operation.
///
/// # Behavior
///
/// - Attribute names are matched case-insensitively, as LDAP does.
/// - Single-valued reads return the first value, or `None` when the attribute is absent.
/// - Operations on an entry that does not exist fail with [`SessionError::Protocol`].
/// - Timeouts are the session's responsibility and surface as [`SessionError::Timeout`].
pub trait DirectorySession: Send + Sync {
    /// Read the first value of an attribute.
    fn read_attribute(
        &self,
        dn: &str,
        attribute: &str,
    ) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;

    /// Read every value of a multi-valued attribute. Absent attributes yield an empty vector.
    fn read_attribute_values(
        &self,
        dn: &str,
        attribute: &str,
    ) -> impl Future<Output = Result<Vec<String>, SessionError>> + Send;

    /// Read the first value of several attributes in one round trip.
    ///
    /// The result is keyed by the requested names; absent attributes are omitted.
    fn read_attributes(
        &self,
        dn: &str,
        attributes: &[&str],
    ) -> impl Future<Output = Result<HashMap<String, String>, SessionError>> + Send;

    /// Replace all values of an attribute with a single value.
    fn write_attribute(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Atomically remove `old` and add `new`.
    ///
    /// Fails without changing anything when `old` is not a current value of the attribute.
    fn replace_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        old: &str,
        new: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Add one value to a multi-valued attribute.
    fn add_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Remove one value from a multi-valued attribute.
    fn remove_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Ask the directory whether the attribute holds the candidate value.
    fn compare_attribute(
        &self,
        dn: &str,
        attribute: &str,
        candidate: &str,
    ) -> impl Future<Output = Result<bool, SessionError>> + Send;

    /// Send a raw extended operation.
    ///
    /// `Ok(None)` means the directory answered without a response value.
    fn extended_operation(
        &self,
        request: ExtendedRequest,
    ) -> impl Future<Output = Result<Option<ExtendedResponse>, SessionError>> + Send;

    /// The live configuration of this session.
    fn config(&self) -> &SharedConfig;

    /// Whether credential operations should use the extended protocol right now.
    fn is_extended_protocol_enabled(&self) -> impl Future<Output = bool> + Send {
        self.config().extended_protocol_enabled()
    }
}
