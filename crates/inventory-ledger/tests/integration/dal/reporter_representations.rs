/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use inventory_ledger::dal::Transaction;
use inventory_ledger::ErrorKind;
use inventory_models::models::reporter_representations::NewReporterRepresentation;
use serde_json::json;
use uuid::Uuid;

use crate::fixtures::TestFixture;

fn representation(
    reporter_resource_id: Uuid,
    version: i64,
    generation: i64,
    transaction_id: Option<&str>,
) -> NewReporterRepresentation {
    NewReporterRepresentation::new(
        reporter_resource_id,
        version,
        generation,
        json!({"satellite_id": format!("sat-{}", version)}),
        Some("1.0".to_string()),
        0,
        transaction_id.map(str::to_string),
        false,
    )
    .expect("Failed to create NewReporterRepresentation")
}

#[test]
fn test_append_and_read_back() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let rr = fixture.insert_test_reporter_resource(resource.id, fixture.unique_key("hbi"));
    let dal = fixture.dal.reporter_representations();

    dal.append(Transaction::Own, &representation(rr.id, 1, 0, None)).unwrap();
    let second = dal.append(Transaction::Own, &representation(rr.id, 2, 0, None)).unwrap();
    assert_eq!(second.data, json!({"satellite_id": "sat-2"}));

    let fetched = dal.get(rr.id, 1, 0).unwrap().unwrap();
    assert_eq!(fetched.version, 1);
    assert_eq!(dal.latest_for(rr.id).unwrap().unwrap().version, 2);
    assert_eq!(dal.list_for(rr.id).unwrap().len(), 2);
    assert!(dal.get(rr.id, 7, 0).unwrap().is_none());
}

#[test]
fn test_versions_strictly_increase_per_generation() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let rr = fixture.insert_test_reporter_resource(resource.id, fixture.unique_key("hbi"));
    let dal = fixture.dal.reporter_representations();

    dal.append(Transaction::Own, &representation(rr.id, 2, 0, None)).unwrap();

    let duplicate = dal.append(Transaction::Own, &representation(rr.id, 2, 0, None)).unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::Conflict);

    let behind = dal.append(Transaction::Own, &representation(rr.id, 1, 0, None)).unwrap_err();
    assert_eq!(behind.kind(), ErrorKind::Conflict);

    // A new generation starts its own sequence.
    dal.append(Transaction::Own, &representation(rr.id, 0, 1, None)).unwrap();
    assert_eq!(dal.latest_for(rr.id).unwrap().unwrap().generation, 1);
}

#[test]
fn test_transaction_id_reuse_is_conflict() {
    let fixture = TestFixture::new();
    let resource = fixture.insert_test_resource();
    let rr = fixture.insert_test_reporter_resource(resource.id, fixture.unique_key("hbi"));
    let dal = fixture.dal.reporter_representations();
    let tx = format!("tx-{}", Uuid::new_v4());

    dal.append(Transaction::Own, &representation(rr.id, 1, 0, Some(&tx))).unwrap();
    let err = dal.append(Transaction::Own, &representation(rr.id, 2, 0, Some(&tx))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Empty transaction ids are stored as NULL and never collide.
    dal.append(Transaction::Own, &representation(rr.id, 2, 0, Some(""))).unwrap();
    dal.append(Transaction::Own, &representation(rr.id, 3, 0, Some(""))).unwrap();
}

#[test]
fn test_missing_reporter_resource_is_not_found() {
    let fixture = TestFixture::new();

    let err = fixture
        .dal
        .reporter_representations()
        .append(Transaction::Own, &representation(Uuid::now_v7(), 1, 0, None))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
