/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! The resource ledger contract and its Postgres implementation.

use inventory_models::models::common_representations::{
    CommonRepresentation, NewCommonRepresentation,
};
use inventory_models::models::reporter_representations::{
    NewReporterRepresentation, ReporterRepresentation,
};
use inventory_models::models::reporter_resources::{
    NewReporterResource, ReporterResource, ReporterResourceKey,
};
use inventory_models::models::representation_references::{
    NewRepresentationReference, ReferenceKey, RepresentationReference,
    RepresentationVersionUpdateFilter,
};
use inventory_models::models::resources::{
    NewResource, NewResourceWithReferences, Resource, ResourceWithReferences,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::dal::{Transaction, DAL};
use crate::error::LedgerError;
use crate::events::{EventOperation, Identity, ProducerRegistry, ResourceEvent};

/// Identity registry, representation ledgers, reference index and aggregate writer behind one
/// object-safe interface.
///
/// Implementations report the same [`crate::error::ErrorKind`] for the same input.
pub trait ResourceLedger: Send + Sync {
    /// Stores a resource and returns its id. A taken id is `InvalidArgument`.
    fn create_resource(&self, resource: &NewResource) -> Result<Uuid, LedgerError>;

    fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, LedgerError>;

    /// Last write wins. A missing resource is `NotFound`.
    fn update_consistency_token(&self, resource_id: Uuid, token: &str) -> Result<(), LedgerError>;

    /// Removes the resource and everything it owns. Returns the number of resources removed.
    fn delete_resource(&self, resource_id: Uuid) -> Result<usize, LedgerError>;

    fn create_reporter_resource(
        &self,
        reporter_resource: &NewReporterResource,
    ) -> Result<ReporterResource, LedgerError>;

    fn get_reporter_resource(
        &self,
        key: &ReporterResourceKey,
    ) -> Result<Option<ReporterResource>, LedgerError>;

    fn tombstone_reporter_resource(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError>;

    /// Moves a tombstoned reporter resource to its next generation; a live one is returned as is.
    fn resurrect_reporter_resource(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError>;

    fn append_reporter_representation(
        &self,
        representation: &NewReporterRepresentation,
    ) -> Result<ReporterRepresentation, LedgerError>;

    fn append_common_representation(
        &self,
        representation: &NewCommonRepresentation,
    ) -> Result<CommonRepresentation, LedgerError>;

    fn append_reference(
        &self,
        reference: &NewRepresentationReference,
    ) -> Result<RepresentationReference, LedgerError>;

    fn find_all_sibling_references(
        &self,
        key: &ReferenceKey,
    ) -> Result<Vec<RepresentationReference>, LedgerError>;

    /// Returns the number of reference rows advanced.
    fn update_representation_version(
        &self,
        filter: &RepresentationVersionUpdateFilter,
        representation_version: i64,
    ) -> Result<i64, LedgerError>;

    fn update_common_representation_version(
        &self,
        resource_id: Uuid,
        representation_version: i64,
    ) -> Result<i64, LedgerError> {
        self.update_representation_version(
            &RepresentationVersionUpdateFilter::common(resource_id),
            representation_version,
        )
    }

    fn update_reporter_representation_version(
        &self,
        resource_id: Uuid,
        reporter_type: &str,
        local_resource_id: &str,
        representation_version: i64,
    ) -> Result<i64, LedgerError> {
        self.update_representation_version(
            &RepresentationVersionUpdateFilter::reporter(resource_id, reporter_type, local_resource_id),
            representation_version,
        )
    }

    /// Writes a resource and its references atomically.
    fn create_resource_with_references(
        &self,
        aggregate: &NewResourceWithReferences,
    ) -> Result<ResourceWithReferences, LedgerError>;
}

/// Postgres-backed ledger.
#[derive(Clone)]
pub struct InventoryLedger {
    dal: DAL,
    producers: ProducerRegistry,
}

impl InventoryLedger {
    pub fn new(dal: DAL) -> Self {
        Self::with_producers(dal, ProducerRegistry::new())
    }

    pub fn with_producers(dal: DAL, producers: ProducerRegistry) -> Self {
        InventoryLedger { dal, producers }
    }

    pub fn dal(&self) -> &DAL {
        &self.dal
    }

    /// Writes the aggregate and stages a `created` outbox event in the same transaction, then
    /// hands the event to the registered producer.
    ///
    /// A producer failure is logged and does not fail the call: the aggregate has committed and
    /// its staged outbox row is left for the relay to deliver.
    pub fn create_resource_with_references_as(
        &self,
        aggregate: &NewResourceWithReferences,
        identity: Option<Identity>,
        transaction_id: Option<String>,
    ) -> Result<ResourceWithReferences, LedgerError> {
        let (created, event) = self.dal.with_transaction(Transaction::Own, |conn| {
            let created = self
                .dal
                .resource_with_references()
                .create(Transaction::Participate(&mut *conn), aggregate)?;

            let event = ResourceEvent {
                resource_type: created.resource.resource_type.clone(),
                resource_id: created.resource.id,
                operation: EventOperation::Created,
                identity,
                transaction_id,
                payload: serde_json::to_value(&created).map_err(|e| {
                    LedgerError::Internal(format!("failed to serialise resource event: {}", e))
                })?,
            };
            self.dal
                .outbox_events()
                .stage(Transaction::Participate(&mut *conn), &event.to_outbox_event()?)?;

            Ok((created, event))
        })?;

        info!(
            resource_id = %created.resource.id,
            resource_type = %created.resource.resource_type,
            references = created.representation_references.len(),
            "Resource created"
        );

        if let Some(producer) = self.producers.lookup(&event.resource_type) {
            if let Err(e) = producer.produce(&event) {
                error!(
                    resource_id = %event.resource_id,
                    error = %e,
                    "Event producer failed; outbox row left for relay"
                );
            }
        }

        Ok(created)
    }
}

impl ResourceLedger for InventoryLedger {
    fn create_resource(&self, resource: &NewResource) -> Result<Uuid, LedgerError> {
        Ok(self.dal.resources().create(Transaction::Own, resource)?.id)
    }

    fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, LedgerError> {
        self.dal.resources().get(resource_id)
    }

    fn update_consistency_token(&self, resource_id: Uuid, token: &str) -> Result<(), LedgerError> {
        self.dal
            .resources()
            .update_consistency_token(Transaction::Own, resource_id, token)
    }

    fn delete_resource(&self, resource_id: Uuid) -> Result<usize, LedgerError> {
        self.dal.resources().delete(Transaction::Own, resource_id)
    }

    fn create_reporter_resource(
        &self,
        reporter_resource: &NewReporterResource,
    ) -> Result<ReporterResource, LedgerError> {
        self.dal
            .reporter_resources()
            .create(Transaction::Own, reporter_resource)
    }

    fn get_reporter_resource(
        &self,
        key: &ReporterResourceKey,
    ) -> Result<Option<ReporterResource>, LedgerError> {
        self.dal.reporter_resources().get_by_key(key)
    }

    fn tombstone_reporter_resource(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError> {
        self.dal
            .reporter_resources()
            .tombstone(Transaction::Own, reporter_resource_id)
    }

    fn resurrect_reporter_resource(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError> {
        self.dal
            .reporter_resources()
            .resurrect(Transaction::Own, reporter_resource_id)
    }

    fn append_reporter_representation(
        &self,
        representation: &NewReporterRepresentation,
    ) -> Result<ReporterRepresentation, LedgerError> {
        self.dal
            .reporter_representations()
            .append(Transaction::Own, representation)
    }

    fn append_common_representation(
        &self,
        representation: &NewCommonRepresentation,
    ) -> Result<CommonRepresentation, LedgerError> {
        self.dal
            .common_representations()
            .append(Transaction::Own, representation)
    }

    fn append_reference(
        &self,
        reference: &NewRepresentationReference,
    ) -> Result<RepresentationReference, LedgerError> {
        self.dal
            .representation_references()
            .append(Transaction::Own, reference)
    }

    fn find_all_sibling_references(
        &self,
        key: &ReferenceKey,
    ) -> Result<Vec<RepresentationReference>, LedgerError> {
        self.dal
            .representation_references()
            .find_all_sibling_references(key)
    }

    fn update_representation_version(
        &self,
        filter: &RepresentationVersionUpdateFilter,
        representation_version: i64,
    ) -> Result<i64, LedgerError> {
        self.dal.representation_references().update_representation_version(
            Transaction::Own,
            filter,
            representation_version,
        )
    }

    fn create_resource_with_references(
        &self,
        aggregate: &NewResourceWithReferences,
    ) -> Result<ResourceWithReferences, LedgerError> {
        self.create_resource_with_references_as(aggregate, None, None)
    }
}
