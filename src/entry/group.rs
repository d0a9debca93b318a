//! Group entry.

use log::debug;
use std::ops::Deref;
use std::sync::Arc;

use super::{DirectoryEntry, UserEntry};
use crate::attributes::names;
use crate::error::DirectoryResult;
use crate::session::DirectorySession;

/// Object class handled by [`GroupEntry`].
pub const OBJECT_CLASS: &str = "groupOfNames";

/// A group entry.
///
/// Membership is recorded on both sides: the user holds `groupMembership` and
/// `securityEquals`, the group holds `member` and `equivalentToMe`. The four writes are
/// issued one after another and are not rolled back if a later one fails.
pub struct GroupEntry<S> {
    entry: DirectoryEntry<S>,
}

impl<S> GroupEntry<S> {
    pub fn new(dn: impl Into<String>, session: Arc<S>) -> Self {
        Self::from_entry(DirectoryEntry::new(dn, session))
    }

    pub fn from_entry(entry: DirectoryEntry<S>) -> Self {
        Self { entry }
    }

    pub fn object_class_name(&self) -> &'static str {
        OBJECT_CLASS
    }

    pub fn into_entry(self) -> DirectoryEntry<S> {
        self.entry
    }
}

impl<S: DirectorySession> GroupEntry<S> {
    /// DNs listed in `member`.
    pub async fn read_members(&self) -> DirectoryResult<Vec<String>> {
        self.entry.read_multi_string_attribute(names::MEMBER).await
    }

    pub async fn add_member(&self, user: &UserEntry<S>) -> DirectoryResult<()> {
        debug!("adding {} to group {}", user.dn(), self.dn());
        user.add_attribute_value(names::GROUP_MEMBERSHIP, self.dn())
            .await?;
        user.add_attribute_value(names::SECURITY_EQUALS, self.dn())
            .await?;
        self.entry
            .add_attribute_value(names::MEMBER, user.dn())
            .await?;
        self.entry
            .add_attribute_value(names::EQUIVALENT_TO_ME, user.dn())
            .await
    }

    pub async fn remove_member(&self, user: &UserEntry<S>) -> DirectoryResult<()> {
        debug!("removing {} from group {}", user.dn(), self.dn());
        user.remove_attribute_value(names::GROUP_MEMBERSHIP, self.dn())
            .await?;
        user.remove_attribute_value(names::SECURITY_EQUALS, self.dn())
            .await?;
        self.entry
            .remove_attribute_value(names::MEMBER, user.dn())
            .await?;
        self.entry
            .remove_attribute_value(names::EQUIVALENT_TO_ME, user.dn())
            .await
    }
}

impl<S> Deref for GroupEntry<S> {
    type Target = DirectoryEntry<S>;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

impl<S> Clone for GroupEntry<S> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry.clone(),
        }
    }
}

impl<S> std::fmt::Debug for GroupEntry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupEntry").field("dn", &self.dn()).finish()
    }
}
