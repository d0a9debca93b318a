//! User entry facade.

use chrono::{DateTime, Utc};
use log::info;
use std::ops::Deref;

use super::{DirectoryEntry, GroupEntry};
use crate::attributes::names;
use crate::challenge::{
    AttributeChallengeSource, ChallengeResponseSource, ChallengeSet, ResponseSet,
};
use crate::dispatcher::{CredentialDispatcher, CredentialMode};
use crate::error::{DirectoryError, DirectoryResult};
use crate::policy::{AssignedPolicyResolver, PasswordPolicy, PolicyResolver};
use crate::session::DirectorySession;

/// Object class handled by [`UserEntry`].
pub const OBJECT_CLASS: &str = "inetOrgPerson";

/// A person entry with identity and credential operations.
///
/// Credential operations go through [`CredentialDispatcher`], so each call honours the
/// session's current extended-protocol setting. Plain attribute access is available through
/// `Deref` to [`DirectoryEntry`].
///
/// ```rust
/// use std::sync::Arc;
/// use ldap_credentials::entry::UserEntry;
/// use ldap_credentials::session::InMemoryDirectory;
///
/// # tokio_test::block_on(async {
/// let directory = Arc::new(InMemoryDirectory::new());
/// directory.add_entry("cn=alice,o=org", [("userPassword", "s3cret")]).await;
///
/// let alice = UserEntry::new("cn=alice,o=org", directory);
/// assert!(alice.test_password("s3cret").await.unwrap());
/// alice.set_password("n3w-s3cret").await.unwrap();
/// assert!(!alice.is_locked().await.unwrap());
/// # });
/// ```
pub struct UserEntry<S> {
    entry: DirectoryEntry<S>,
}

impl<S> UserEntry<S> {
    pub fn new(dn: impl Into<String>, session: std::sync::Arc<S>) -> Self {
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

impl<S: DirectorySession> UserEntry<S> {
    fn credentials(&self) -> CredentialDispatcher<'_, S> {
        CredentialDispatcher::new(&self.entry)
    }

    /// The mode the next credential operation would use.
    pub async fn credential_mode(&self) -> CredentialMode {
        self.credentials().mode().await
    }

    pub async fn read_given_name(&self) -> DirectoryResult<Option<String>> {
        self.entry.read_string_attribute(names::GIVEN_NAME).await
    }

    pub async fn read_last_login_time(&self) -> DirectoryResult<Option<DateTime<Utc>>> {
        self.entry.read_date_attribute(names::LAST_LOGIN).await
    }

    pub async fn test_password_policy(&self, password: &str) -> DirectoryResult<bool> {
        self.credentials().test_password_policy(password).await
    }

    pub async fn test_password(&self, password: &str) -> DirectoryResult<bool> {
        self.credentials().test_password(password).await
    }

    pub async fn read_password(&self) -> DirectoryResult<String> {
        self.credentials().read_password().await
    }

    pub async fn set_password(&self, new_password: &str) -> DirectoryResult<()> {
        self.credentials().set_password(new_password).await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> DirectoryResult<()> {
        self.credentials()
            .change_password(old_password, new_password)
            .await
    }

    pub async fn unlock(&self) -> DirectoryResult<()> {
        self.credentials().unlock().await
    }

    pub async fn expire_password(&self) -> DirectoryResult<()> {
        self.credentials().expire_password().await
    }

    pub async fn is_password_expired(&self) -> DirectoryResult<bool> {
        self.credentials().is_password_expired().await
    }

    pub async fn read_password_expiration_date(&self) -> DirectoryResult<Option<DateTime<Utc>>> {
        self.credentials().read_password_expiration_date().await
    }

    pub async fn is_locked(&self) -> DirectoryResult<bool> {
        self.credentials().is_locked().await
    }

    /// Policy from `resolver`, or `None` if it reports no usable policy.
    pub async fn read_password_policy<R: PolicyResolver>(
        &self,
        resolver: &R,
    ) -> DirectoryResult<Option<PasswordPolicy>> {
        absent_on_validation(
            "password policy",
            self.dn(),
            resolver.resolve_policy(&self.entry).await,
        )
    }

    /// Policy referenced by the entry's `nspmPasswordPolicyDN`.
    pub async fn password_policy(&self) -> DirectoryResult<Option<PasswordPolicy>> {
        self.read_password_policy(&AssignedPolicyResolver).await
    }

    pub async fn read_assigned_challenge_set<C: ChallengeResponseSource>(
        &self,
        source: &C,
    ) -> DirectoryResult<Option<ChallengeSet>> {
        absent_on_validation(
            "challenge set",
            self.dn(),
            source.read_assigned_challenge_set(&self.entry).await,
        )
    }

    pub async fn read_response_set<C: ChallengeResponseSource>(
        &self,
        source: &C,
    ) -> DirectoryResult<Option<ResponseSet>> {
        absent_on_validation(
            "response set",
            self.dn(),
            source.read_response_set(&self.entry).await,
        )
    }

    /// [`read_assigned_challenge_set`](Self::read_assigned_challenge_set) with the attribute
    /// source.
    pub async fn challenge_set(&self) -> DirectoryResult<Option<ChallengeSet>> {
        self.read_assigned_challenge_set(&AttributeChallengeSource::new())
            .await
    }

    pub async fn add_group_membership(&self, group: &GroupEntry<S>) -> DirectoryResult<()> {
        group.add_member(self).await
    }

    pub async fn remove_group_membership(&self, group: &GroupEntry<S>) -> DirectoryResult<()> {
        group.remove_member(self).await
    }

    /// DNs of the groups this user belongs to.
    pub async fn read_group_memberships(&self) -> DirectoryResult<Vec<String>> {
        self.entry
            .read_multi_string_attribute(names::GROUP_MEMBERSHIP)
            .await
    }
}

fn absent_on_validation<T>(
    what: &str,
    dn: &str,
    result: DirectoryResult<T>,
) -> DirectoryResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DirectoryError::Validation(e)) => {
            info!("error reading {} for {}: {}", what, dn, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl<S> Deref for UserEntry<S> {
    type Target = DirectoryEntry<S>;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

impl<S> Clone for UserEntry<S> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry.clone(),
        }
    }
}

impl<S> std::fmt::Debug for UserEntry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry").field("dn", &self.dn()).finish()
    }
}
