//! Credential operations through the NMAS extended operations.

use crate::common::*;
use ldap_credentials::extended::codes;
use ldap_credentials::session::{PasswordRules, ScriptedResponse, SessionError};
use ldap_credentials::{CredentialMode, CredentialOperation, DirectoryError};
use tokio_test::{assert_err, assert_ok};

fn standard_rules() -> PasswordRules {
    PasswordRules {
        min_length: 8,
        reject_reuse: true,
    }
}

#[tokio::test]
async fn test_mode_is_extended() {
    let directory = seeded_directory(true).await;
    assert_eq!(
        alice(&directory).credential_mode().await,
        CredentialMode::ExtendedProtocol
    );
}

#[tokio::test]
async fn test_read_password() {
    let directory = seeded_directory(true).await;
    assert_eq!(assert_ok!(alice(&directory).read_password().await), ALICE_PASSWORD);
}

#[tokio::test]
async fn test_read_password_nonzero_code() {
    let directory = seeded_directory(true).await;
    directory
        .script(CredentialOperation::Get, ScriptedResponse::Code(codes::NO_PASSWORD))
        .await;

    let error = assert_err!(alice(&directory).read_password().await);
    assert!(matches!(
        error,
        DirectoryError::Operation { code: Some(codes::NO_PASSWORD), .. }
    ));
}

#[tokio::test]
async fn test_read_password_success_without_payload() {
    let directory = seeded_directory(true).await;
    directory
        .script(CredentialOperation::Get, ScriptedResponse::Code(codes::SUCCESS))
        .await;

    let error = assert_err!(alice(&directory).read_password().await);
    assert!(matches!(
        error,
        DirectoryError::Operation {
            code: Some(codes::SUCCESS),
            ..
        }
    ));
}

#[tokio::test]
async fn test_read_password_scripted_payload() {
    let directory = seeded_directory(true).await;
    directory
        .script(
            CredentialOperation::Get,
            ScriptedResponse::Password("from-the-server".to_string()),
        )
        .await;
    assert_eq!(assert_ok!(alice(&directory).read_password().await), "from-the-server");
}

#[tokio::test]
async fn test_policy_check_against_server_rules() {
    let directory = strict_directory(standard_rules()).await;
    let user = alice(&directory);

    assert!(assert_ok!(user.test_password_policy("long-enough-pw").await));

    let error = assert_err!(user.test_password_policy("short").await);
    assert!(matches!(
        error,
        DirectoryError::PasswordPolicyViolation { code: Some(codes::PASSWORD_TOO_SHORT), .. }
    ));

    let error = assert_err!(user.test_password_policy(ALICE_PASSWORD).await);
    assert_eq!(error.code(), Some(codes::DUPLICATE_PASSWORD));
}

#[tokio::test]
async fn test_policy_check_tolerates_outage() {
    let directory = seeded_directory(true).await;
    directory.set_unavailable(true).await;
    assert!(assert_ok!(alice(&directory).test_password_policy("short").await));
}

#[tokio::test]
async fn test_policy_check_null_response_passes() {
    let directory = seeded_directory(true).await;
    directory
        .script(CredentialOperation::PolicyCheck, ScriptedResponse::Null)
        .await;
    assert!(assert_ok!(alice(&directory).test_password_policy("short").await));
}

#[tokio::test]
async fn test_set_password() {
    let directory = strict_directory(standard_rules()).await;
    let user = alice(&directory);

    assert_ok!(user.set_password("another-good-one").await);
    assert_eq!(assert_ok!(user.read_password().await), "another-good-one");

    let error = assert_err!(user.set_password("tiny").await);
    assert_eq!(error.code(), Some(codes::PASSWORD_TOO_SHORT));
    assert!(error.to_string().contains("too short"));
    assert_eq!(assert_ok!(user.read_password().await), "another-good-one");
}

#[tokio::test]
async fn test_change_password() {
    let directory = strict_directory(standard_rules()).await;
    let user = alice(&directory);

    let error = assert_err!(user.change_password("wrong-old-password", "fresh-password").await);
    assert!(matches!(
        error,
        DirectoryError::PasswordPolicyViolation { code: Some(codes::FAILED_AUTHENTICATION), .. }
    ));

    assert_ok!(user.change_password(ALICE_PASSWORD, "fresh-password").await);
    assert!(assert_ok!(user.test_password("fresh-password").await));
}

#[tokio::test]
async fn test_change_password_null_response_is_success() {
    let directory = seeded_directory(true).await;
    directory
        .script(CredentialOperation::Change, ScriptedResponse::Null)
        .await;
    assert_ok!(alice(&directory).change_password("anything", "else").await);
}

#[tokio::test]
async fn test_change_password_outage_is_surfaced() {
    let directory = seeded_directory(true).await;
    directory
        .script(
            CredentialOperation::Change,
            ScriptedResponse::Fail(SessionError::unavailable("connection reset")),
        )
        .await;

    let error = assert_err!(alice(&directory).change_password(ALICE_PASSWORD, "x").await);
    assert!(error.is_transport_unavailable());
}

#[tokio::test]
async fn test_requests_target_the_entry() {
    let directory = seeded_directory(true).await;

    // Bob's password comes back for Bob, so the request carried Bob's DN.
    assert_eq!(assert_ok!(bob(&directory).read_password().await), BOB_PASSWORD);
    assert_eq!(assert_ok!(alice(&directory).read_password().await), ALICE_PASSWORD);
}
