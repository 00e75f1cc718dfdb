/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use inventory_ledger::dal::Transaction;
use inventory_ledger::ErrorKind;
use inventory_models::models::reporter_resources::NewReporterResource;
use uuid::Uuid;

use crate::fixtures::TestFixture;

#[test]
fn test_create_and_get_by_key() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let key = fixture.unique_key("hbi");

    let created = fixture.insert_test_reporter_resource(resource.id, key.clone());
    assert_eq!(created.resource_id, resource.id);
    assert_eq!(created.generation, 0);
    assert_eq!(created.representation_version, 0);
    assert!(!created.tombstone);

    let by_key = fixture.dal.reporter_resources().get_by_key(&key).unwrap().unwrap();
    assert_eq!(by_key.id, created.id);

    let by_id = fixture.dal.reporter_resources().get(created.id).unwrap().unwrap();
    assert_eq!(by_id.key(), key);
}

#[test]
fn test_duplicate_key_is_conflict() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let key = fixture.unique_key("hbi");
    fixture.insert_test_reporter_resource(resource.id, key.clone());

    let duplicate = NewReporterResource::new(key, resource.id, String::new(), None).unwrap();
    let err = fixture
        .dal
        .reporter_resources()
        .create(Transaction::Own, &duplicate)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_missing_resource_is_not_found() {
    let fixture = TestFixture::new();
    let orphan =
        NewReporterResource::new(fixture.unique_key("hbi"), Uuid::now_v7(), String::new(), None).unwrap();

    let err = fixture
        .dal
        .reporter_resources()
        .create(Transaction::Own, &orphan)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_list_for_resource() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let other = fixture.insert_test_resource();
    fixture.insert_test_reporter_resource(resource.id, fixture.unique_key("hbi"));
    fixture.insert_test_reporter_resource(resource.id, fixture.unique_key("acm"));
    fixture.insert_test_reporter_resource(other.id, fixture.unique_key("hbi"));

    let listed = fixture.dal.reporter_resources().list_for_resource(resource.id).unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|rr| rr.resource_id == resource.id));
}

#[test]
fn test_update_representation_version_never_moves_back() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let rr = fixture.insert_test_reporter_resource(resource.id, fixture.unique_key("hbi"));

    let updated = fixture
        .dal
        .reporter_resources()
        .update_representation_version(Transaction::Own, rr.id, 3)
        .unwrap();
    assert_eq!(updated.representation_version, 3);

    let stale = fixture
        .dal
        .reporter_resources()
        .update_representation_version(Transaction::Own, rr.id, 2)
        .unwrap_err();
    assert_eq!(stale.kind(), ErrorKind::Conflict);

    let missing = fixture
        .dal
        .reporter_resources()
        .update_representation_version(Transaction::Own, Uuid::now_v7(), 1)
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[test]
fn test_tombstone_and_resurrect() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let rr = fixture.insert_test_reporter_resource(resource.id, fixture.unique_key("hbi"));

    let live = fixture.dal.reporter_resources().resurrect(Transaction::Own, rr.id).unwrap();
    assert_eq!(live.generation, 0);

    let tombstoned = fixture.dal.reporter_resources().tombstone(Transaction::Own, rr.id).unwrap();
    assert!(tombstoned.tombstone);
    assert_eq!(tombstoned.generation, 0);

    let resurrected = fixture.dal.reporter_resources().resurrect(Transaction::Own, rr.id).unwrap();
    assert!(!resurrected.tombstone);
    assert_eq!(resurrected.generation, 1);

    let again = fixture.dal.reporter_resources().resurrect(Transaction::Own, rr.id).unwrap();
    assert_eq!(again.generation, 1);

    let missing = fixture
        .dal
        .reporter_resources()
        .resurrect(Transaction::Own, Uuid::now_v7())
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}
