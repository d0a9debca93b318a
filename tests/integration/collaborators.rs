//! Password policy and challenge/response lookups through the user facade.

use crate::common::*;
use chrono::Duration;
use ldap_credentials::challenge::{AttributeChallengeSource, ChallengeResponse, ResponseSet};
use ldap_credentials::policy::AssignedPolicyResolver;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_assigned_password_policy() {
    let directory = seeded_directory(false).await;
    let policy = assert_ok!(alice(&directory).password_policy().await).unwrap();

    assert_eq!(policy.source_dn(), Some(POLICY_DN));
    assert_eq!(policy.min_length(), Some(12));
    assert_eq!(policy.max_length(), Some(64));
    assert_eq!(policy.expiration_interval(), Some(Duration::days(90)));
    assert!(policy.unique_required());
    assert!(policy.allow_change());
}

#[tokio::test]
async fn test_no_policy_is_absent() {
    let directory = seeded_directory(false).await;
    let policy = assert_ok!(bob(&directory).read_password_policy(&AssignedPolicyResolver).await);
    assert!(policy.is_none());
}

#[tokio::test]
async fn test_dangling_policy_reference_is_an_error() {
    let directory = seeded_directory(false).await;
    assert!(directory.remove_entry(POLICY_DN).await);
    assert!(!directory.contains_entry(POLICY_DN).await);
    // The policy entry itself is missing: an operation failure, not a validation signal.
    let error = assert_err!(alice(&directory).password_policy().await);
    assert_eq!(error.code(), Some(32));
}

#[tokio::test]
async fn test_assigned_challenge_set_and_responses() {
    let directory = seeded_directory(false).await;
    let user = alice(&directory);
    let source = AttributeChallengeSource::new();

    let set = assert_ok!(user.read_assigned_challenge_set(&source).await).unwrap();
    assert_eq!(set.source_dn(), Some(CHALLENGE_SET_DN));
    assert_eq!(set.challenges().len(), 3);
    assert_eq!(set.min_random_required(), 1);

    let responses = assert_ok!(user.read_response_set(&source).await).unwrap();
    assert_eq!(responses.locale.as_deref(), Some("en"));
    assert_eq!(responses.responses.len(), 2);
    assert!(responses.satisfies(&set));
}

#[tokio::test]
async fn test_missing_challenge_data_is_absent() {
    let directory = seeded_directory(false).await;
    let user = bob(&directory);
    let source = AttributeChallengeSource::new();

    assert!(assert_ok!(user.read_assigned_challenge_set(&source).await).is_none());
    assert!(assert_ok!(user.read_response_set(&source).await).is_none());
}

#[tokio::test]
async fn test_malformed_responses_are_absent() {
    let directory = seeded_directory(false).await;
    directory
        .set_values(ALICE_DN, "pwmResponseSet", ["<responses/>"])
        .await;

    let responses = assert_ok!(
        alice(&directory)
            .read_response_set(&AttributeChallengeSource::new())
            .await
    );
    assert!(responses.is_none());
}

#[tokio::test]
async fn test_stored_response_set_round_trip() {
    let directory = seeded_directory(false).await;
    let user = bob(&directory);
    let responses = ResponseSet {
        locale: Some("de".to_string()),
        timestamp: None,
        responses: vec![ChallengeResponse {
            challenge: "What was the name of your first pet?".to_string(),
            answer: "bello".to_string(),
        }],
    };
    let stored = assert_ok!(responses.to_json());
    assert_ok!(user.write_string_attribute("pwmResponseSet", &stored).await);

    let read = assert_ok!(
        user.read_response_set(&AttributeChallengeSource::new())
            .await
    );
    assert_eq!(read, Some(responses));
}
