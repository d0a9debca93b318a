//! Credential operations for directory entries.
//!
//! Exposes identity and credential operations (password test, set, change, expire, lockout
//! status, challenge/response metadata) on directory entries, switching per call between
//! plain attribute access and the NMAS credential extended operations.
//!
//! # Core Components
//!
//! - [`UserEntry`] - the public facade for person entries
//! - [`CredentialDispatcher`] - routes each credential operation by [`CredentialMode`]
//! - [`extended`] - NMAS request/response types and their BER codec
//! - [`DirectorySession`] - the directory capability everything runs on
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ldap_credentials::{DirectoryConfig, UserEntry};
//! use ldap_credentials::session::LdapSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (conn, mut ldap) = ldap3::LdapConnAsync::new("ldap://directory.example.com:389").await?;
//! ldap3::drive!(conn);
//! ldap.simple_bind("cn=admin,o=org", "secret").await?.success()?;
//!
//! let config = DirectoryConfig::new().with_extended_protocol(true);
//! let session = Arc::new(LdapSession::new(ldap, config));
//!
//! let user = UserEntry::new("cn=alice,ou=people,o=org", session);
//! user.test_password_policy("correct horse battery staple").await?;
//! user.set_password("correct horse battery staple").await?;
//! if user.is_password_expired().await? {
//!     println!("expired at {:?}", user.read_password_expiration_date().await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod challenge;
pub mod config;
pub mod dispatcher;
pub mod entry;
pub mod error;
pub mod extended;
pub mod generalized_time;
pub mod policy;
pub mod session;

// Re-export commonly used types for convenience
pub use config::{DirectoryConfig, SharedConfig};
pub use dispatcher::{CredentialDispatcher, CredentialMode};
pub use entry::{DirectoryEntry, Entry, EntryFactory, EntryKind, GroupEntry, UserEntry};
pub use error::{DirectoryError, DirectoryResult, ValidationError};
pub use session::{DirectorySession, InMemoryDirectory, SessionError};

pub use challenge::{AttributeChallengeSource, ChallengeResponseSource, ChallengeSet, ResponseSet};
pub use extended::{CredentialOperation, CredentialRequest, CredentialResponse};
pub use policy::{AssignedPolicyResolver, PasswordPolicy, PolicyResolver};
