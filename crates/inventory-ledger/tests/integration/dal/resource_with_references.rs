/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use inventory_ledger::dal::Transaction;
use inventory_ledger::{ErrorKind, LedgerError};
use inventory_models::models::representation_references::NewRepresentationReference;
use inventory_models::models::resources::{NewResource, NewResourceWithReferences};
use uuid::Uuid;

use crate::fixtures::TestFixture;

#[test]
fn test_create_aggregate() {
    let fixture = TestFixture::new();
    let hbi = fixture.unique_key("hbi");
    let acm = fixture.unique_key("acm");

    let aggregate = NewResourceWithReferences::new(
        NewResource::new("host".to_string(), 0).unwrap(),
        vec![
            NewRepresentationReference::new(Uuid::nil(), hbi.clone(), 0, 0, false).unwrap(),
            NewRepresentationReference::new(Uuid::nil(), acm, 0, 0, false).unwrap(),
        ],
    );
    let created = fixture
        .dal
        .resource_with_references()
        .create(Transaction::Own, &aggregate)
        .expect("Failed to create aggregate");

    assert_eq!(created.representation_references.len(), 2);
    assert!(created
        .representation_references
        .iter()
        .all(|r| r.resource_id == created.resource.id));

    let siblings = fixture
        .dal
        .representation_references()
        .find_all_sibling_references(&hbi)
        .unwrap();
    assert_eq!(siblings.len(), 2);
}

#[test]
fn test_aggregate_with_no_references() {
    let fixture = TestFixture::new();

    let created = fixture
        .dal
        .resource_with_references()
        .create(
            Transaction::Own,
            &NewResourceWithReferences::new(NewResource::new("host".to_string(), 0).unwrap(), Vec::new()),
        )
        .unwrap();
    assert!(created.representation_references.is_empty());
    assert!(fixture.dal.resources().get(created.resource.id).unwrap().is_some());
}

#[test]
fn test_aggregate_without_resource_is_invalid() {
    let fixture = TestFixture::new();

    let err = fixture
        .dal
        .resource_with_references()
        .create(Transaction::Own, &NewResourceWithReferences::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_failed_aggregate_leaves_nothing() {
    let fixture = TestFixture::new();
    let key = fixture.unique_key("hbi");
    let new_resource = NewResource::new("host".to_string(), 0).unwrap();

    let aggregate = NewResourceWithReferences::new(
        new_resource.clone(),
        vec![
            NewRepresentationReference::new(Uuid::nil(), key.clone(), 0, 0, false).unwrap(),
            NewRepresentationReference::new(Uuid::nil(), key.clone(), 0, 0, false).unwrap(),
        ],
    );
    let err = fixture
        .dal
        .resource_with_references()
        .create(Transaction::Own, &aggregate)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert!(fixture.dal.resources().get(new_resource.id).unwrap().is_none());
    assert!(fixture
        .dal
        .representation_references()
        .find_all_sibling_references(&key)
        .unwrap()
        .is_empty());
}

#[test]
fn test_participating_aggregate_rolls_back_with_caller() {
    let fixture = TestFixture::new();
    let key = fixture.unique_key("hbi");
    let new_resource = NewResource::new("host".to_string(), 0).unwrap();
    let aggregate = NewResourceWithReferences::new(
        new_resource.clone(),
        vec![NewRepresentationReference::new(Uuid::nil(), key.clone(), 0, 0, false).unwrap()],
    );

    let err = fixture
        .dal
        .with_transaction(Transaction::Own, |conn| {
            let created = fixture
                .dal
                .resource_with_references()
                .create(Transaction::Participate(&mut *conn), &aggregate)?;
            assert_eq!(created.resource.id, new_resource.id);
            Err::<(), _>(LedgerError::Internal("caller aborted".to_string()))
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert!(fixture.dal.resources().get(new_resource.id).unwrap().is_none());
    assert!(fixture
        .dal
        .representation_references()
        .find_all_sibling_references(&key)
        .unwrap()
        .is_empty());
}
