//! Configuration loading and live credential mode changes.

use crate::common::*;
use ldap_credentials::session::InMemoryDirectory;
use ldap_credentials::{CredentialMode, DirectoryConfig, DirectoryError, DirectorySession};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_mode_follows_live_configuration() {
    let directory = seeded_directory(false).await;
    let user = alice(&directory);

    let error = assert_err!(user.read_password().await);
    assert!(matches!(error, DirectoryError::UnsupportedOperation { .. }));

    directory.config().set_extended_protocol(true).await;
    assert_eq!(user.credential_mode().await, CredentialMode::ExtendedProtocol);
    assert_eq!(assert_ok!(user.read_password().await), ALICE_PASSWORD);

    directory.config().set_extended_protocol(false).await;
    assert_err!(user.read_password().await);
}

#[tokio::test]
async fn test_directory_built_from_json_configuration() {
    init_logging();
    let config = assert_ok!(DirectoryConfig::from_json(
        r#"{ "extendedProtocolEnabled": true, "responseSetAttribute": "pwmResponseSet" }"#
    ));
    let directory = Arc::new(InMemoryDirectory::with_config(config));
    seed(&directory).await;

    assert!(directory.is_extended_protocol_enabled().await);
    assert_eq!(assert_ok!(alice(&directory).read_password().await), ALICE_PASSWORD);
}

#[tokio::test]
async fn test_sessions_share_replaced_configuration() {
    let directory = seeded_directory(false).await;
    let clone = (*directory).clone();

    directory
        .config()
        .replace(DirectoryConfig::new().with_extended_protocol(true))
        .await;
    assert!(clone.is_extended_protocol_enabled().await);
}
