//! Credential operations with the extended protocol disabled.

use crate::common::*;
use ldap_credentials::session::SessionError;
use ldap_credentials::{CredentialMode, DirectoryError, DirectorySession};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_mode_is_attribute() {
    let directory = seeded_directory(false).await;
    assert_eq!(alice(&directory).credential_mode().await, CredentialMode::Attribute);
}

#[tokio::test]
async fn test_policy_check_is_permissive_without_remote_call() {
    let directory = seeded_directory(false).await;
    let before = directory.request_count();

    assert!(assert_ok!(alice(&directory).test_password_policy("x").await));
    assert_eq!(directory.request_count(), before);
}

#[tokio::test]
async fn test_read_password_is_unsupported() {
    let directory = seeded_directory(false).await;
    let before = directory.request_count();

    let error = assert_err!(alice(&directory).read_password().await);
    assert!(matches!(error, DirectoryError::UnsupportedOperation { .. }));
    assert_eq!(directory.request_count(), before);
}

#[tokio::test]
async fn test_set_password_writes_attribute() {
    let directory = seeded_directory(false).await;
    let user = alice(&directory);

    assert_ok!(user.set_password("brand-new-password").await);
    assert!(assert_ok!(user.test_password("brand-new-password").await));
    assert!(!assert_ok!(user.test_password(ALICE_PASSWORD).await));
}

#[tokio::test]
async fn test_set_password_write_failure_is_policy_violation() {
    let directory = seeded_directory(false).await;
    directory
        .fail_attribute(
            "userPassword",
            SessionError::protocol(19, "constraint violation"),
        )
        .await;

    let error = assert_err!(alice(&directory).set_password("rejected").await);
    assert!(matches!(
        error,
        DirectoryError::PasswordPolicyViolation { code: Some(19), .. }
    ));
    assert!(error.to_string().contains("constraint violation"));
}

#[tokio::test]
async fn test_change_password_requires_old_value() {
    let directory = seeded_directory(false).await;
    let user = alice(&directory);

    let error = assert_err!(user.change_password("not-the-password", "next-one").await);
    assert!(matches!(error, DirectoryError::PasswordPolicyViolation { .. }));
    assert!(assert_ok!(user.test_password(ALICE_PASSWORD).await));

    assert_ok!(user.change_password(ALICE_PASSWORD, "next-one").await);
    assert!(assert_ok!(user.test_password("next-one").await));
    let stored = assert_ok!(directory.read_attribute_values(ALICE_DN, "userPassword").await);
    assert_eq!(stored, vec!["next-one"]);
}

#[tokio::test]
async fn test_compare_failure_is_policy_violation() {
    let directory = seeded_directory(false).await;
    let ghost = ldap_credentials::UserEntry::new("cn=ghost,ou=people,o=example", directory.clone());

    let error = assert_err!(ghost.test_password("anything").await);
    assert!(matches!(
        error,
        DirectoryError::PasswordPolicyViolation { code: Some(32), .. }
    ));
}

#[tokio::test]
async fn test_compare_transport_failure_is_surfaced() {
    let directory = seeded_directory(false).await;
    directory.set_unavailable(true).await;

    let error = assert_err!(alice(&directory).test_password(ALICE_PASSWORD).await);
    assert!(error.is_transport_unavailable());
}

#[tokio::test]
async fn test_unavailable_write_is_surfaced() {
    let directory = seeded_directory(false).await;
    directory.set_unavailable(true).await;

    let error = assert_err!(bob(&directory).unlock().await);
    assert!(error.is_transport_unavailable());
}
