//! Typed entry construction from object classes.

use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{DirectoryEntry, GroupEntry, UserEntry, group, user};
use crate::error::DirectoryResult;
use crate::session::DirectorySession;

/// Which typed wrapper an object class maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    User,
    Group,
}

/// An entry opened through [`EntryFactory`].
pub enum Entry<S> {
    User(UserEntry<S>),
    Group(GroupEntry<S>),
    /// No registered object class matched.
    Generic(DirectoryEntry<S>),
}

impl<S> Entry<S> {
    pub fn kind(&self) -> Option<EntryKind> {
        match self {
            Entry::User(_) => Some(EntryKind::User),
            Entry::Group(_) => Some(EntryKind::Group),
            Entry::Generic(_) => None,
        }
    }

    pub fn dn(&self) -> &str {
        match self {
            Entry::User(user) => user.dn(),
            Entry::Group(group) => group.dn(),
            Entry::Generic(entry) => entry.dn(),
        }
    }

    pub fn into_user(self) -> Option<UserEntry<S>> {
        match self {
            Entry::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_group(self) -> Option<GroupEntry<S>> {
        match self {
            Entry::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl<S> Clone for Entry<S> {
    fn clone(&self) -> Self {
        match self {
            Entry::User(user) => Entry::User(user.clone()),
            Entry::Group(group) => Entry::Group(group.clone()),
            Entry::Generic(entry) => Entry::Generic(entry.clone()),
        }
    }
}

impl<S> fmt::Debug for Entry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::User(user) => f.debug_tuple("User").field(user).finish(),
            Entry::Group(group) => f.debug_tuple("Group").field(group).finish(),
            Entry::Generic(entry) => f.debug_tuple("Generic").field(entry).finish(),
        }
    }
}

/// Registry of object class name to [`EntryKind`].
///
/// Class names match case-insensitively. When an entry carries several registered classes,
/// the first one listed on the entry wins.
#[derive(Debug, Clone, Default)]
pub struct EntryFactory {
    kinds: HashMap<String, EntryKind>,
}

impl EntryFactory {
    /// An empty registry; every entry opens as [`Entry::Generic`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `inetOrgPerson` and `groupOfNames`.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(user::OBJECT_CLASS, EntryKind::User)
            .register(group::OBJECT_CLASS, EntryKind::Group)
    }

    pub fn register(mut self, object_class: &str, kind: EntryKind) -> Self {
        self.kinds.insert(object_class.to_ascii_lowercase(), kind);
        self
    }

    pub fn kind_for(&self, object_class: &str) -> Option<EntryKind> {
        self.kinds.get(&object_class.to_ascii_lowercase()).copied()
    }

    /// Read the entry's object classes and wrap it accordingly.
    pub async fn open<S: DirectorySession>(
        &self,
        session: Arc<S>,
        dn: impl Into<String>,
    ) -> DirectoryResult<Entry<S>> {
        let entry = DirectoryEntry::new(dn, session);
        let classes = entry.read_object_classes().await?;
        Ok(self.wrap(entry, &classes))
    }

    /// Wrap an entry whose object classes are already known.
    pub fn wrap<S>(&self, entry: DirectoryEntry<S>, object_classes: &[String]) -> Entry<S> {
        match object_classes.iter().find_map(|class| self.kind_for(class)) {
            Some(EntryKind::User) => Entry::User(UserEntry::from_entry(entry)),
            Some(EntryKind::Group) => Entry::Group(GroupEntry::from_entry(entry)),
            None => {
                debug!(
                    "no registered object class for {} (classes: {:?})",
                    entry.dn(),
                    object_classes
                );
                Entry::Generic(entry)
            }
        }
    }
}
