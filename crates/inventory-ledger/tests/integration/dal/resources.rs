/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use inventory_ledger::dal::Transaction;
use inventory_ledger::ErrorKind;
use inventory_models::models::resources::NewResource;
use uuid::Uuid;

use crate::fixtures::TestFixture;

#[test]
fn test_create_and_get_resource() {
    let fixture = TestFixture::new();

    let new_resource = NewResource::new("host".to_string(), 0).expect("Failed to create NewResource");
    let created = fixture
        .dal
        .resources()
        .create(Transaction::Own, &new_resource)
        .expect("Failed to create resource");

    assert_eq!(created.id, new_resource.id);
    assert_eq!(created.resource_type, "host");
    assert_eq!(created.consistency_token, "");

    let retrieved = fixture.dal.resources().get(created.id).expect("Failed to get resource").unwrap();
    assert_eq!(retrieved, created);

    assert!(fixture.dal.resources().get(Uuid::now_v7()).unwrap().is_none());
}

#[test]
fn test_nil_resource_id_is_generated() {
    let fixture = TestFixture::new();

    let mut new_resource = NewResource::new("host".to_string(), 0).unwrap();
    new_resource.id = Uuid::nil();
    let created = fixture
        .dal
        .resources()
        .create(Transaction::Own, &new_resource)
        .expect("Failed to create resource with nil id");

    assert!(!created.id.is_nil());
    assert_eq!(created.id.get_version_num(), 7);
    assert!(fixture.dal.resources().get(created.id).unwrap().is_some());
}

#[test]
fn test_duplicate_resource_id_is_invalid_argument() {
    let fixture = TestFixture::new();
    let created = fixture.insert_test_resource();

    let duplicate = NewResource::with_id(created.id, "host".to_string(), 0).unwrap();
    let err = fixture
        .dal
        .resources()
        .create(Transaction::Own, &duplicate)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // The failed insert only rolled back its savepoint.
    assert!(fixture.dal.resources().get(created.id).unwrap().is_some());
}

#[test]
fn test_update_consistency_token() {
    let fixture = TestFixture::new();
    let created = fixture.insert_test_resource();

    fixture
        .dal
        .resources()
        .update_consistency_token(Transaction::Own, created.id, "token-1")
        .expect("Failed to update token");
    fixture
        .dal
        .resources()
        .update_consistency_token(Transaction::Own, created.id, "token-2")
        .expect("Failed to update token");

    let retrieved = fixture.dal.resources().get(created.id).unwrap().unwrap();
    assert_eq!(retrieved.consistency_token, "token-2");

    let missing = fixture
        .dal
        .resources()
        .update_consistency_token(Transaction::Own, Uuid::now_v7(), "token")
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let too_long = "t".repeat(1025);
    let err = fixture
        .dal
        .resources()
        .update_consistency_token(Transaction::Own, created.id, &too_long)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_update_common_version() {
    let fixture = TestFixture::new();
    let created = fixture.insert_test_resource();

    let updated = fixture
        .dal
        .resources()
        .update_common_version(Transaction::Own, created.id, 4)
        .expect("Failed to update common version");
    assert_eq!(updated.common_version, 4);
    assert_eq!(updated.id, created.id);
}

#[test]
fn test_delete_resource() {
    let fixture = TestFixture::new();
    let created = fixture.insert_test_resource();

    assert_eq!(fixture.dal.resources().delete(Transaction::Own, created.id).unwrap(), 1);
    assert!(fixture.dal.resources().get(created.id).unwrap().is_none());
    assert_eq!(fixture.dal.resources().delete(Transaction::Own, created.id).unwrap(), 0);
}
