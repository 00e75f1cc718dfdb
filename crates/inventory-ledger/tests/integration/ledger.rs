/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use std::sync::{Arc, Mutex};

use inventory_ledger::events::{EventOperation, EventProducer, Identity, ProducerRegistry, ResourceEvent};
use inventory_ledger::{ErrorKind, InMemoryLedger, InventoryLedger, LedgerError, ResourceLedger};
use inventory_models::models::outbox_events::RESOURCE_AGGREGATE_TYPE;
use inventory_models::models::reporter_representations::NewReporterRepresentation;
use inventory_models::models::reporter_resources::NewReporterResource;
use inventory_models::models::representation_references::{NewRepresentationReference, ReferenceKey};
use inventory_models::models::resources::{NewResource, NewResourceWithReferences};
use serde_json::json;
use uuid::Uuid;

use crate::fixtures::TestFixture;

#[derive(Default)]
struct RecordingProducer {
    events: Mutex<Vec<ResourceEvent>>,
    fail: bool,
}

impl EventProducer for RecordingProducer {
    fn produce(&self, event: &ResourceEvent) -> Result<(), LedgerError> {
        if self.fail {
            return Err(LedgerError::Unavailable("broker down".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn aggregate(key: &ReferenceKey) -> NewResourceWithReferences {
    NewResourceWithReferences::new(
        NewResource::new("host".to_string(), 0).unwrap(),
        vec![NewRepresentationReference::new(Uuid::nil(), key.clone(), 0, 0, false).unwrap()],
    )
}

#[test]
fn test_aggregate_stages_and_produces_event() {
    let fixture = TestFixture::new();
    let producer = Arc::new(RecordingProducer::default());
    let mut registry = ProducerRegistry::new();
    registry.register("host", producer.clone());
    let ledger = InventoryLedger::with_producers(fixture.dal.clone(), registry);
    let key = fixture.unique_key("hbi");

    let created = ledger
        .create_resource_with_references_as(
            &aggregate(&key),
            Some(Identity::new("svc-reporter")),
            Some("tx-aggregate".to_string()),
        )
        .expect("Failed to create aggregate");

    let events = producer.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].operation, EventOperation::Created);
    assert_eq!(events[0].resource_id, created.resource.id);
    assert_eq!(events[0].identity.as_ref().unwrap().principal, "svc-reporter");

    let staged = fixture
        .dal
        .outbox_events()
        .list_for_aggregate(RESOURCE_AGGREGATE_TYPE, &created.resource.id.to_string())
        .unwrap();
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].operation, "created");
    assert_eq!(staged[0].txid.as_deref(), Some("tx-aggregate"));
}

#[test]
fn test_producer_failure_keeps_committed_write() {
    let fixture = TestFixture::new();
    let mut registry = ProducerRegistry::new();
    registry.set_default(Arc::new(RecordingProducer {
        fail: true,
        ..Default::default()
    }));
    let ledger = InventoryLedger::with_producers(fixture.dal.clone(), registry);
    let key = fixture.unique_key("hbi");

    let created = ledger
        .create_resource_with_references(&aggregate(&key))
        .expect("a failed producer must not fail a committed write");

    // The caller learns the generated id, so there is nothing to retry.
    let siblings = ledger.find_all_sibling_references(&key).unwrap();
    assert_eq!(siblings.len(), 1);
    assert_eq!(siblings[0].resource_id, created.resource.id);
    assert!(ledger.get_resource(created.resource.id).unwrap().is_some());

    let staged = fixture
        .dal
        .outbox_events()
        .list_for_aggregate(RESOURCE_AGGREGATE_TYPE, &created.resource.id.to_string())
        .unwrap();
    assert_eq!(staged.len(), 1, "event left in the outbox for the relay");
}

/// Runs the same sequence against a ledger and returns the error kinds seen.
fn error_kinds(ledger: &dyn ResourceLedger, key: &ReferenceKey) -> Vec<ErrorKind> {
    let mut kinds = Vec::new();
    let mut record = |result: Result<(), LedgerError>| {
        if let Err(e) = result {
            kinds.push(e.kind());
        }
    };

    let resource = NewResource::new("host".to_string(), 0).unwrap();
    let id = ledger.create_resource(&resource).unwrap();
    record(ledger.create_resource(&resource).map(|_| ()));
    record(ledger.update_consistency_token(Uuid::now_v7(), "t"));

    let rr = NewReporterResource::new(key.clone(), id, String::new(), None).unwrap();
    let rr = ledger.create_reporter_resource(&rr).unwrap();
    let mut again = NewReporterResource::new(key.clone(), id, String::new(), None).unwrap();
    again.id = Uuid::now_v7();
    record(ledger.create_reporter_resource(&again).map(|_| ()));
    record(ledger.resurrect_reporter_resource(Uuid::now_v7()).map(|_| ()));

    // Empty transaction ids are exempt from uniqueness; real ones are not.
    let transaction_id = format!("tx-{}", Uuid::now_v7());
    for (version, tx) in [(1, ""), (2, ""), (3, transaction_id.as_str()), (4, transaction_id.as_str())] {
        let mut rep =
            NewReporterRepresentation::new(rr.id, version, 0, json!({}), None, 0, None, false).unwrap();
        rep.transaction_id = Some(tx.to_string());
        record(ledger.append_reporter_representation(&rep).map(|_| ()));
    }

    record(ledger.update_common_representation_version(Uuid::now_v7(), 1).map(|_| ()));
    record(
        ledger
            .create_resource_with_references(&NewResourceWithReferences::default())
            .map(|_| ()),
    );
    kinds
}

#[test]
fn test_backends_agree_on_error_kinds() {
    let fixture = TestFixture::new();
    let key = fixture.unique_key("hbi");

    let postgres = error_kinds(&InventoryLedger::new(fixture.dal.clone()), &key);
    let memory = error_kinds(&InMemoryLedger::new(), &key);

    assert_eq!(
        postgres,
        vec![
            ErrorKind::InvalidArgument,
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::NotFound,
            ErrorKind::InvalidArgument,
        ]
    );
    assert_eq!(postgres, memory);
}
