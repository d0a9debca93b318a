//! Directory entries.
//!
//! A [`DirectoryEntry`] is a stateless proxy: a distinguished name plus a shared session.
//! All state lives in the directory; an entry object holds nothing that can go stale
//! except the name itself, and becomes useless once the remote entry is deleted.
//!
//! Typed entries wrap it:
//!
//! - [`UserEntry`] - identity and credential operations
//! - [`GroupEntry`] - group membership
//!
//! and [`EntryFactory`] picks between them from an entry's object classes.

pub mod factory;
pub mod group;
pub mod user;

pub use factory::{Entry, EntryFactory, EntryKind};
pub use group::GroupEntry;
pub use user::UserEntry;

use std::fmt;
use std::sync::Arc;

use crate::attributes::names;
use crate::error::DirectoryResult;
use crate::session::DirectorySession;

/// A named entry in the directory.
pub struct DirectoryEntry<S> {
    dn: String,
    session: Arc<S>,
}

impl<S> DirectoryEntry<S> {
    pub fn new(dn: impl Into<String>, session: Arc<S>) -> Self {
        Self {
            dn: dn.into(),
            session,
        }
    }

    /// The entry's distinguished name.
    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Another entry on the same session.
    pub fn sibling(&self, dn: impl Into<String>) -> Self {
        Self::new(dn, Arc::clone(&self.session))
    }
}

impl<S: DirectorySession> DirectoryEntry<S> {
    /// Object classes of the entry, as stored.
    pub async fn read_object_classes(&self) -> DirectoryResult<Vec<String>> {
        self.read_multi_string_attribute(names::OBJECT_CLASS).await
    }
}

impl<S> Clone for DirectoryEntry<S> {
    fn clone(&self) -> Self {
        Self {
            dn: self.dn.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

impl<S> fmt::Debug for DirectoryEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryEntry").field("dn", &self.dn).finish()
    }
}

impl<S> fmt::Display for DirectoryEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dn)
    }
}

impl<S> PartialEq for DirectoryEntry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.dn.eq_ignore_ascii_case(&other.dn)
    }
}
