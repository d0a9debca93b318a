//! Attribute accessor for directory entries.
//!
//! Typed reads, writes and compares of string attributes on a [`DirectoryEntry`]. Each call
//! is one round trip through the entry's session; nothing is cached and nothing is retried.
//! Session failures are converted into [`DirectoryError`](crate::DirectoryError) here.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::entry::DirectoryEntry;
use crate::error::DirectoryResult;
use crate::generalized_time;
use crate::session::DirectorySession;

/// Attribute names used by the credential operations.
pub mod names {
    pub const OBJECT_CLASS: &str = "objectClass";
    pub const PASSWORD: &str = "userPassword";
    pub const GIVEN_NAME: &str = "givenName";
    pub const LAST_LOGIN: &str = "loginTime";
    pub const PASSWORD_EXPIRE_TIME: &str = "passwordExpirationTime";

    pub const LOCKED_BY_INTRUDER: &str = "lockedByIntruder";
    pub const LOGIN_INTRUDER_ATTEMPTS: &str = "loginIntruderAttempts";
    pub const LOGIN_INTRUDER_RESET_TIME: &str = "loginIntruderResetTime";
    pub const LOGIN_GRACE_LIMIT: &str = "loginGraceLimit";
    pub const LOGIN_GRACE_REMAINING: &str = "loginGraceRemaining";

    pub const GROUP_MEMBERSHIP: &str = "groupMembership";
    pub const SECURITY_EQUALS: &str = "securityEquals";
    pub const MEMBER: &str = "member";
    pub const EQUIVALENT_TO_ME: &str = "equivalentToMe";

    pub const PASSWORD_POLICY_DN: &str = "nspmPasswordPolicyDN";
    pub const CHALLENGE_SET_DN: &str = "nsimAssignedChallengeSetDN";
}

/// Directory spelling of boolean true.
pub const TRUE: &str = "TRUE";
/// Directory spelling of boolean false.
pub const FALSE: &str = "FALSE";

impl<S: DirectorySession> DirectoryEntry<S> {
    /// Read the first value of an attribute.
    pub async fn read_string_attribute(&self, name: &str) -> DirectoryResult<Option<String>> {
        Ok(self.session().read_attribute(self.dn(), name).await?)
    }

    /// Read every value of an attribute.
    pub async fn read_multi_string_attribute(&self, name: &str) -> DirectoryResult<Vec<String>> {
        Ok(self.session().read_attribute_values(self.dn(), name).await?)
    }

    /// Read several attributes in one round trip, keyed by the requested names.
    ///
    /// Absent attributes are left out of the map.
    pub async fn read_string_attributes(
        &self,
        names: &[&str],
    ) -> DirectoryResult<HashMap<String, String>> {
        Ok(self.session().read_attributes(self.dn(), names).await?)
    }

    /// Replace the attribute's values with `value`.
    pub async fn write_string_attribute(&self, name: &str, value: &str) -> DirectoryResult<()> {
        Ok(self.session().write_attribute(self.dn(), name, value).await?)
    }

    /// Whether the attribute holds `candidate`, decided by the directory.
    pub async fn compare_string_attribute(
        &self,
        name: &str,
        candidate: &str,
    ) -> DirectoryResult<bool> {
        Ok(self.session().compare_attribute(self.dn(), name, candidate).await?)
    }

    /// Swap `old` for `new`; fails, changing nothing, if `old` is not currently held.
    pub async fn replace_attribute_value(
        &self,
        name: &str,
        old: &str,
        new: &str,
    ) -> DirectoryResult<()> {
        Ok(self
            .session()
            .replace_attribute_value(self.dn(), name, old, new)
            .await?)
    }

    pub async fn add_attribute_value(&self, name: &str, value: &str) -> DirectoryResult<()> {
        Ok(self.session().add_attribute_value(self.dn(), name, value).await?)
    }

    pub async fn remove_attribute_value(&self, name: &str, value: &str) -> DirectoryResult<()> {
        Ok(self
            .session()
            .remove_attribute_value(self.dn(), name, value)
            .await?)
    }

    /// `true` only when the attribute reads `TRUE` (any case); absent means `false`.
    pub async fn read_boolean_attribute(&self, name: &str) -> DirectoryResult<bool> {
        let value = self.read_string_attribute(name).await?;
        Ok(parse_boolean(value.as_deref()))
    }

    pub async fn write_boolean_attribute(&self, name: &str, value: bool) -> DirectoryResult<()> {
        self.write_string_attribute(name, if value { TRUE } else { FALSE })
            .await
    }

    /// Read an integer attribute; absent or unparsable values give `default`.
    pub async fn read_int_attribute(&self, name: &str, default: i64) -> DirectoryResult<i64> {
        let value = self.read_string_attribute(name).await?;
        Ok(parse_int(value.as_deref(), default))
    }

    /// Read a generalized-time attribute.
    pub async fn read_date_attribute(&self, name: &str) -> DirectoryResult<Option<DateTime<Utc>>> {
        match self.read_string_attribute(name).await? {
            Some(value) if !value.trim().is_empty() => Ok(Some(generalized_time::parse(&value)?)),
            _ => Ok(None),
        }
    }

    pub async fn write_date_attribute(
        &self,
        name: &str,
        value: &DateTime<Utc>,
    ) -> DirectoryResult<()> {
        self.write_string_attribute(name, &generalized_time::format(value))
            .await
    }
}

pub(crate) fn parse_boolean(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(TRUE))
}

pub(crate) fn parse_int(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
