//! Password policy lookup.
//!
//! A user's effective policy lives in its own directory entry, referenced from the user by
//! `nspmPasswordPolicyDN`. [`AssignedPolicyResolver`] follows that reference; other
//! resolvers can be plugged in through [`PolicyResolver`].

use chrono::Duration;
use log::debug;
use std::collections::HashMap;
use std::future::Future;

use crate::attributes::{names, parse_boolean, parse_int};
use crate::entry::DirectoryEntry;
use crate::error::{DirectoryResult, ValidationError};
use crate::session::DirectorySession;

/// Policy entry attribute names.
pub mod settings {
    pub const MIN_LENGTH: &str = "nspmMinPasswordLength";
    pub const MAX_LENGTH: &str = "nspmMaxPasswordLength";
    pub const EXPIRATION_INTERVAL: &str = "passwordExpirationInterval";
    pub const UNIQUE_REQUIRED: &str = "passwordUniqueRequired";
    pub const ALLOW_CHANGE: &str = "passwordAllowChange";

    pub const ALL: [&str; 5] = [
        MIN_LENGTH,
        MAX_LENGTH,
        EXPIRATION_INTERVAL,
        UNIQUE_REQUIRED,
        ALLOW_CHANGE,
    ];
}

/// Password rules read from a policy entry.
///
/// Raw values are kept as stored; the getters interpret them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordPolicy {
    source_dn: Option<String>,
    values: HashMap<String, String>,
}

impl PasswordPolicy {
    pub fn new(source_dn: Option<String>, values: HashMap<String, String>) -> Self {
        Self { source_dn, values }
    }

    /// DN of the entry the policy was read from.
    pub fn source_dn(&self) -> Option<&str> {
        self.source_dn.as_deref()
    }

    /// Raw value of a setting.
    pub fn value(&self, setting: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(setting))
            .map(|(_, value)| value.as_str())
    }

    pub fn min_length(&self) -> Option<u32> {
        self.positive(settings::MIN_LENGTH)
    }

    pub fn max_length(&self) -> Option<u32> {
        self.positive(settings::MAX_LENGTH)
    }

    /// How long a new password stays valid. The directory stores seconds.
    pub fn expiration_interval(&self) -> Option<Duration> {
        let seconds = parse_int(self.value(settings::EXPIRATION_INTERVAL), 0);
        (seconds > 0).then(|| Duration::seconds(seconds))
    }

    pub fn unique_required(&self) -> bool {
        parse_boolean(self.value(settings::UNIQUE_REQUIRED))
    }

    /// Whether users may change their own password. Defaults to allowed when unset.
    pub fn allow_change(&self) -> bool {
        match self.value(settings::ALLOW_CHANGE) {
            Some(value) => parse_boolean(Some(value)),
            None => true,
        }
    }

    fn positive(&self, setting: &str) -> Option<u32> {
        u32::try_from(parse_int(self.value(setting), 0))
            .ok()
            .filter(|n| *n > 0)
    }
}

/// Finds the password policy governing an entry.
///
/// Resolvers report "no policy" as [`ValidationError`], which the user facade absorbs.
pub trait PolicyResolver: Send + Sync {
    fn resolve_policy<S: DirectorySession>(
        &self,
        entry: &DirectoryEntry<S>,
    ) -> impl Future<Output = DirectoryResult<PasswordPolicy>> + Send;
}

/// Follows the entry's `nspmPasswordPolicyDN` reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignedPolicyResolver;

impl PolicyResolver for AssignedPolicyResolver {
    async fn resolve_policy<S: DirectorySession>(
        &self,
        entry: &DirectoryEntry<S>,
    ) -> DirectoryResult<PasswordPolicy> {
        let policy_dn = entry
            .read_string_attribute(names::PASSWORD_POLICY_DN)
            .await?
            .filter(|dn| !dn.trim().is_empty())
            .ok_or_else(|| ValidationError::NoPolicyAssigned {
                dn: entry.dn().to_string(),
            })?;

        debug!("reading password policy {} for {}", policy_dn, entry.dn());
        let policy_entry = entry.sibling(policy_dn.clone());
        let values = policy_entry.read_string_attributes(&settings::ALL).await?;
        Ok(PasswordPolicy::new(Some(policy_dn), values))
    }
}
