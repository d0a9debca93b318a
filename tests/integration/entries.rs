//! Entry factory dispatch and group membership.

use crate::common::*;
use ldap_credentials::{Entry, EntryFactory, EntryKind};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_factory_opens_typed_entries() {
    let directory = seeded_directory(false).await;
    let factory = EntryFactory::with_defaults();

    let user = assert_ok!(factory.open(Arc::clone(&directory), ALICE_DN).await);
    assert_eq!(user.kind(), Some(EntryKind::User));
    let user = user.into_user().unwrap();
    assert_eq!(assert_ok!(user.read_given_name().await).as_deref(), Some("Alice"));

    let group = assert_ok!(factory.open(Arc::clone(&directory), STAFF_DN).await);
    assert_eq!(group.into_group().map(|g| g.object_class_name()), Some("groupOfNames"));

    let container = assert_ok!(factory.open(Arc::clone(&directory), PEOPLE_DN).await);
    assert!(matches!(container, Entry::Generic(_)));
}

#[tokio::test]
async fn test_factory_missing_entry() {
    let directory = seeded_directory(false).await;
    let error = assert_err!(
        EntryFactory::with_defaults()
            .open(directory, "cn=missing,o=example")
            .await
    );
    assert_eq!(error.code(), Some(32));
}

#[tokio::test]
async fn test_group_membership_round_trip() {
    let directory = seeded_directory(false).await;
    let (alice, bob, staff) = (alice(&directory), bob(&directory), staff(&directory));

    assert_ok!(alice.add_group_membership(&staff).await);
    assert_ok!(staff.add_member(&bob).await);

    let mut members = assert_ok!(staff.read_members().await);
    members.sort();
    assert_eq!(members, vec![ALICE_DN, BOB_DN]);
    assert_eq!(assert_ok!(alice.read_group_memberships().await), vec![STAFF_DN]);
    assert_eq!(
        assert_ok!(bob.read_multi_string_attribute("securityEquals").await),
        vec![STAFF_DN]
    );

    assert_ok!(alice.remove_group_membership(&staff).await);
    assert_eq!(assert_ok!(staff.read_members().await), vec![BOB_DN]);
    assert!(assert_ok!(alice.read_group_memberships().await).is_empty());
    assert_eq!(
        assert_ok!(staff.read_multi_string_attribute("equivalentToMe").await),
        vec![BOB_DN]
    );
}

#[tokio::test]
async fn test_removing_non_member_fails() {
    let directory = seeded_directory(false).await;
    let error = assert_err!(alice(&directory).remove_group_membership(&staff(&directory)).await);
    assert_eq!(error.code(), Some(16));
}
