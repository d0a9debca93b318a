//! Lockout, unlock and password expiry.

use crate::common::*;
use chrono::{Duration, Timelike, Utc};
use ldap_credentials::DirectorySession;
use ldap_credentials::generalized_time::{self, EPOCH_SENTINEL};
use ldap_credentials::session::SessionError;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_unlock_clears_lockout() {
    let directory = seeded_directory(false).await;
    let user = bob(&directory);
    assert!(assert_ok!(user.is_locked().await));

    assert_ok!(user.unlock().await);

    assert!(!assert_ok!(user.is_locked().await));
    let values = assert_ok!(
        directory
            .read_attributes(
                BOB_DN,
                &[
                    "lockedByIntruder",
                    "loginIntruderAttempts",
                    "loginIntruderResetTime",
                    "loginGraceRemaining",
                ],
            )
            .await
    );
    assert_eq!(values["lockedByIntruder"], "FALSE");
    assert_eq!(values["loginIntruderAttempts"], "0");
    assert_eq!(values["loginIntruderResetTime"], EPOCH_SENTINEL);
    // No grace limit on bob, so no remaining count is written.
    assert!(!values.contains_key("loginGraceRemaining"));
}

#[tokio::test]
async fn test_unlock_restores_grace_logins() {
    let directory = seeded_directory(true).await;
    directory.set_values(ALICE_DN, "loginGraceRemaining", ["1"]).await;
    let user = alice(&directory);

    assert_ok!(user.unlock().await);
    let remaining = assert_ok!(directory.read_attribute(ALICE_DN, "loginGraceRemaining").await);
    assert_eq!(remaining.as_deref(), Some("5"));
}

#[tokio::test]
async fn test_unlock_stops_at_first_failure() {
    let directory = seeded_directory(false).await;
    directory
        .fail_attribute("loginIntruderResetTime", SessionError::protocol(50, "insufficient access"))
        .await;
    let user = bob(&directory);

    let error = assert_err!(user.unlock().await);
    assert_eq!(error.code(), Some(50));

    // The first two writes stay applied.
    assert!(!assert_ok!(user.is_locked().await));
    let attempts = assert_ok!(directory.read_attribute(BOB_DN, "loginIntruderAttempts").await);
    assert_eq!(attempts.as_deref(), Some("0"));
    let reset = assert_ok!(directory.read_attribute(BOB_DN, "loginIntruderResetTime").await);
    assert_eq!(reset.as_deref(), Some("20250601120000Z"));
}

#[tokio::test]
async fn test_expire_password_writes_sentinel() {
    let directory = seeded_directory(false).await;
    let user = alice(&directory);
    assert_ok!(user.expire_password().await);

    let reset = assert_ok!(
        directory
            .read_attribute(ALICE_DN, "loginIntruderResetTime")
            .await
    );
    assert_eq!(reset.as_deref(), Some(EPOCH_SENTINEL));
    let reset = assert_ok!(user.read_date_attribute("loginIntruderResetTime").await);
    assert_eq!(reset, Some(generalized_time::epoch_sentinel()));
}

#[tokio::test]
async fn test_not_expired_with_matching_counters() {
    let directory = seeded_directory(false).await;
    let user = alice(&directory);

    assert!(!assert_ok!(user.is_password_expired().await));
    assert_eq!(assert_ok!(user.read_password_expiration_date().await), None);
}

#[tokio::test]
async fn test_counters_disagreeing_means_expired() {
    let directory = seeded_directory(false).await;
    directory.set_values(ALICE_DN, "loginGraceRemaining", ["3"]).await;
    directory
        .set_values(
            ALICE_DN,
            "passwordExpirationTime",
            [generalized_time_from_now(Duration::days(30))],
        )
        .await;

    assert!(assert_ok!(alice(&directory).is_password_expired().await));
}

#[tokio::test]
async fn test_missing_counters_default_to_not_expired() {
    let directory = seeded_directory(false).await;
    let user = bob(&directory);

    assert!(!assert_ok!(user.is_password_expired().await));
}

#[tokio::test]
async fn test_past_expiration_time() {
    let directory = seeded_directory(false).await;
    let past = generalized_time_from_now(-Duration::hours(2));
    directory
        .set_values(ALICE_DN, "passwordExpirationTime", [past.clone()])
        .await;
    let user = alice(&directory);

    assert!(assert_ok!(user.is_password_expired().await));
    let date = assert_ok!(user.read_password_expiration_date().await).unwrap();
    assert_eq!(generalized_time::format(&date), past);
}

#[tokio::test]
async fn test_future_expiration_time() {
    let directory = seeded_directory(false).await;
    let user = alice(&directory);
    let future = (Utc::now() + Duration::days(10)).with_nanosecond(0).unwrap();
    assert_ok!(
        user.write_date_attribute("passwordExpirationTime", &future)
            .await
    );

    assert!(!assert_ok!(user.is_password_expired().await));
    let date = assert_ok!(user.read_password_expiration_date().await);
    assert_eq!(date, Some(future));
}

#[tokio::test]
async fn test_expired_without_timestamp_synthesizes_now() {
    let directory = seeded_directory(false).await;
    directory.set_values(ALICE_DN, "loginGraceRemaining", ["0"]).await;
    let before = Utc::now();

    let date = assert_ok!(alice(&directory).read_password_expiration_date().await).unwrap();
    assert!(date >= before - Duration::seconds(1));
    assert!(date <= Utc::now() + Duration::seconds(1));
}

#[tokio::test]
async fn test_unparsable_expiration_time_is_an_error() {
    let directory = seeded_directory(false).await;
    directory
        .set_values(ALICE_DN, "passwordExpirationTime", ["next tuesday"])
        .await;
    assert_err!(alice(&directory).is_password_expired().await);
}
