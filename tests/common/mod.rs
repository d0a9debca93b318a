//! Common test utilities for credential operation testing.
//!
//! Builds in-memory directories seeded with typical person, group, policy and challenge set
//! entries, and user handles bound to them.

use ldap_credentials::session::{InMemoryDirectory, PasswordRules};
use ldap_credentials::{DirectoryConfig, GroupEntry, UserEntry};
use std::sync::{Arc, Once};


pub use fixtures::*;

static INIT_LOGGER: Once = Once::new();

/// Route `log` output through env_logger once per test binary.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Directory in the requested mode, seeded with the standard fixtures.
pub async fn seeded_directory(extended_protocol: bool) -> Arc<InMemoryDirectory> {
    init_logging();
    let config = DirectoryConfig::new().with_extended_protocol(extended_protocol);
    let directory = Arc::new(InMemoryDirectory::with_config(config));
    seed(&directory).await;
    directory
}

/// Seeded directory whose emulated server enforces `rules`.
pub async fn strict_directory(rules: PasswordRules) -> Arc<InMemoryDirectory> {
    let directory = seeded_directory(true).await;
    directory.set_password_rules(rules).await;
    directory
}

pub fn alice(directory: &Arc<InMemoryDirectory>) -> UserEntry<InMemoryDirectory> {
    UserEntry::new(ALICE_DN, Arc::clone(directory))
}

pub fn bob(directory: &Arc<InMemoryDirectory>) -> UserEntry<InMemoryDirectory> {
    UserEntry::new(BOB_DN, Arc::clone(directory))
}

pub fn staff(directory: &Arc<InMemoryDirectory>) -> GroupEntry<InMemoryDirectory> {
    GroupEntry::new(STAFF_DN, Arc::clone(directory))
}

/// Generalized time `offset` from now.
pub fn generalized_time_from_now(offset: chrono::Duration) -> String {
    ldap_credentials::generalized_time::format(&(chrono::Utc::now() + offset))
}
