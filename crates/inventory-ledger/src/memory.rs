/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! In-memory [`ResourceLedger`] for tests and local development.
//!
//! Mirrors the Postgres constraints: natural-key and composite-key uniqueness, transaction id
//! uniqueness (empty ids are exempt, like the partial indexes), version monotonicity and
//! ownership. Single-row writes validate everything before mutating; the aggregate write removes
//! what it inserted when a later row fails. Ownership is tracked in an index keyed by resource
//! id; deleting a resource clears everything listed under it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
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
use inventory_models::models::MAX_CONSISTENCY_TOKEN_LENGTH;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::ledger::ResourceLedger;

#[derive(Debug, Default)]
struct OwnedRows {
    reporter_resources: BTreeSet<Uuid>,
    common_versions: BTreeSet<i64>,
    references: BTreeSet<i64>,
}

#[derive(Debug, Default)]
struct State {
    resources: HashMap<Uuid, Resource>,
    reporter_resources: HashMap<Uuid, ReporterResource>,
    reporter_keys: HashMap<ReporterResourceKey, Uuid>,
    /// Keyed by (reporter_resource_id, generation, version).
    reporter_representations: BTreeMap<(Uuid, i64, i64), ReporterRepresentation>,
    common_representations: BTreeMap<(Uuid, i64), CommonRepresentation>,
    references: BTreeMap<i64, RepresentationReference>,
    next_reference_id: i64,
    reporter_transaction_ids: HashSet<String>,
    common_transaction_ids: HashSet<String>,
    owned: HashMap<Uuid, OwnedRows>,
}

/// Mutex-guarded in-memory ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reporter representations, common representations and references currently held.
    pub fn row_counts(&self) -> Result<(usize, usize, usize), LedgerError> {
        let state = self.lock()?;
        Ok((
            state.reporter_representations.len(),
            state.common_representations.len(),
            state.references.len(),
        ))
    }

    pub fn list_references_for_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<Vec<RepresentationReference>, LedgerError> {
        let state = self.lock()?;
        Ok(state
            .references
            .values()
            .filter(|r| r.resource_id == resource_id)
            .cloned()
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Internal("in-memory ledger lock poisoned".to_string()))
    }

    fn write<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut State) -> Result<T, LedgerError>,
    {
        let mut state = self.lock()?;
        f(&mut state)
    }
}

impl State {
    fn insert_resource(&mut self, new_resource: &NewResource) -> Result<Resource, LedgerError> {
        let id = if new_resource.id.is_nil() {
            Uuid::now_v7()
        } else {
            new_resource.id
        };
        if self.resources.contains_key(&id) {
            return Err(LedgerError::InvalidArgument(format!(
                "resource {} already exists",
                id
            )));
        }

        let now = Utc::now();
        let resource = Resource {
            id,
            resource_type: new_resource.resource_type.clone(),
            common_version: new_resource.common_version,
            consistency_token: new_resource.consistency_token.clone(),
            created_at: now,
            updated_at: now,
        };
        self.resources.insert(id, resource.clone());
        self.owned.insert(id, OwnedRows::default());
        Ok(resource)
    }

    /// Removes a resource and every row it owns. Returns whether the resource existed.
    fn remove_resource(&mut self, resource_id: Uuid) -> bool {
        if self.resources.remove(&resource_id).is_none() {
            return false;
        }
        let owned = self.owned.remove(&resource_id).unwrap_or_default();

        for reporter_resource_id in owned.reporter_resources {
            if let Some(rr) = self.reporter_resources.remove(&reporter_resource_id) {
                self.reporter_keys.remove(&rr.key());
            }
            let keys: Vec<(Uuid, i64, i64)> = self
                .reporter_representations
                .range(
                    (reporter_resource_id, i64::MIN, i64::MIN)
                        ..=(reporter_resource_id, i64::MAX, i64::MAX),
                )
                .map(|(k, _)| *k)
                .collect();
            for key in keys {
                if let Some(rep) = self.reporter_representations.remove(&key) {
                    if let Some(tx) = rep.transaction_id {
                        self.reporter_transaction_ids.remove(&tx);
                    }
                }
            }
        }
        for version in owned.common_versions {
            if let Some(rep) = self.common_representations.remove(&(resource_id, version)) {
                if let Some(tx) = rep.transaction_id {
                    self.common_transaction_ids.remove(&tx);
                }
            }
        }
        for reference_id in owned.references {
            self.references.remove(&reference_id);
        }
        true
    }

    fn require_resource(&self, resource_id: Uuid) -> Result<(), LedgerError> {
        if self.resources.contains_key(&resource_id) {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("resource {}", resource_id)))
        }
    }

    fn reporter_resource_mut(&mut self, id: Uuid) -> Result<&mut ReporterResource, LedgerError> {
        self.reporter_resources
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("reporter_resources {}", id)))
    }

    fn insert_reference(
        &mut self,
        new_reference: &NewRepresentationReference,
    ) -> Result<RepresentationReference, LedgerError> {
        if new_reference.resource_id.is_nil() {
            return Err(LedgerError::InvalidArgument(
                "representation reference requires a resource_id".to_string(),
            ));
        }
        self.require_resource(new_reference.resource_id)?;

        let candidate = RepresentationReference {
            id: self.next_reference_id + 1,
            resource_id: new_reference.resource_id,
            local_resource_id: new_reference.local_resource_id.clone(),
            reporter_type: new_reference.reporter_type.clone(),
            resource_type: new_reference.resource_type.clone(),
            reporter_instance_id: new_reference.reporter_instance_id.clone(),
            representation_version: new_reference.representation_version,
            generation: new_reference.generation,
            tombstone: new_reference.tombstone,
        };
        if self
            .references
            .values()
            .any(|existing| same_pointer(existing, &candidate))
        {
            return Err(LedgerError::Conflict(format!(
                "representation_references ({}, {}, {}, {}, {}, {})",
                candidate.resource_id,
                candidate.reporter_type,
                candidate.resource_type,
                candidate.reporter_instance_id,
                candidate.representation_version,
                candidate.generation
            )));
        }

        self.next_reference_id = candidate.id;
        self.references.insert(candidate.id, candidate.clone());
        if let Some(owned) = self.owned.get_mut(&candidate.resource_id) {
            owned.references.insert(candidate.id);
        }
        Ok(candidate)
    }
}

/// Same key under the unique index over (resource, reporter, version, generation).
fn same_pointer(a: &RepresentationReference, b: &RepresentationReference) -> bool {
    a.id != b.id
        && a.resource_id == b.resource_id
        && a.reporter_type == b.reporter_type
        && a.resource_type == b.resource_type
        && a.reporter_instance_id == b.reporter_instance_id
        && a.representation_version == b.representation_version
        && a.generation == b.generation
}

/// Transaction id subject to uniqueness; NULL and empty ids never collide.
fn unique_transaction_id(transaction_id: &Option<String>) -> Option<&str> {
    transaction_id.as_deref().filter(|tx| !tx.is_empty())
}

fn reference_matches(reference: &RepresentationReference, key: &ReferenceKey) -> bool {
    reference.local_resource_id == key.local_resource_id
        && reference.reporter_type == key.reporter_type
        && reference.resource_type == key.resource_type
        && reference.reporter_instance_id == key.reporter_instance_id
}

impl ResourceLedger for InMemoryLedger {
    fn create_resource(&self, resource: &NewResource) -> Result<Uuid, LedgerError> {
        self.write(|state| Ok(state.insert_resource(resource)?.id))
    }

    fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, LedgerError> {
        Ok(self.lock()?.resources.get(&resource_id).cloned())
    }

    fn update_consistency_token(&self, resource_id: Uuid, token: &str) -> Result<(), LedgerError> {
        if token.chars().count() > MAX_CONSISTENCY_TOKEN_LENGTH {
            return Err(LedgerError::InvalidArgument(format!(
                "consistency_token exceeds maximum length of {}",
                MAX_CONSISTENCY_TOKEN_LENGTH
            )));
        }
        self.write(|state| {
            let resource = state
                .resources
                .get_mut(&resource_id)
                .ok_or_else(|| LedgerError::NotFound(format!("resource {}", resource_id)))?;
            resource.consistency_token = token.to_string();
            resource.updated_at = Utc::now();
            Ok(())
        })
    }

    fn delete_resource(&self, resource_id: Uuid) -> Result<usize, LedgerError> {
        self.write(|state| Ok(usize::from(state.remove_resource(resource_id))))
    }

    fn create_reporter_resource(
        &self,
        reporter_resource: &NewReporterResource,
    ) -> Result<ReporterResource, LedgerError> {
        self.write(|state| {
            let key = ReporterResourceKey::new(
                reporter_resource.local_resource_id.clone(),
                reporter_resource.reporter_type.clone(),
                reporter_resource.resource_type.clone(),
                reporter_resource.reporter_instance_id.clone(),
            );
            if state.reporter_keys.contains_key(&key)
                || state.reporter_resources.contains_key(&reporter_resource.id)
            {
                return Err(LedgerError::Conflict(format!(
                    "reporter_resources ({}, {}, {}, {})",
                    key.local_resource_id, key.reporter_type, key.resource_type, key.reporter_instance_id
                )));
            }
            state.require_resource(reporter_resource.resource_id)?;

            let now = Utc::now();
            let created = ReporterResource {
                id: reporter_resource.id,
                local_resource_id: key.local_resource_id.clone(),
                reporter_type: key.reporter_type.clone(),
                resource_type: key.resource_type.clone(),
                reporter_instance_id: key.reporter_instance_id.clone(),
                resource_id: reporter_resource.resource_id,
                api_href: reporter_resource.api_href.clone(),
                console_href: reporter_resource.console_href.clone(),
                representation_version: reporter_resource.representation_version,
                generation: reporter_resource.generation,
                tombstone: reporter_resource.tombstone,
                created_at: now,
                updated_at: now,
            };
            state.reporter_keys.insert(key, created.id);
            state.reporter_resources.insert(created.id, created.clone());
            if let Some(owned) = state.owned.get_mut(&created.resource_id) {
                owned.reporter_resources.insert(created.id);
            }
            Ok(created)
        })
    }

    fn get_reporter_resource(
        &self,
        key: &ReporterResourceKey,
    ) -> Result<Option<ReporterResource>, LedgerError> {
        let state = self.lock()?;
        Ok(state
            .reporter_keys
            .get(key)
            .and_then(|id| state.reporter_resources.get(id))
            .cloned())
    }

    fn tombstone_reporter_resource(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError> {
        self.write(|state| {
            let rr = state.reporter_resource_mut(reporter_resource_id)?;
            rr.tombstone = true;
            rr.updated_at = Utc::now();
            Ok(rr.clone())
        })
    }

    fn resurrect_reporter_resource(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError> {
        self.write(|state| {
            let rr = state.reporter_resource_mut(reporter_resource_id)?;
            if rr.tombstone {
                rr.generation += 1;
                rr.tombstone = false;
                rr.updated_at = Utc::now();
            }
            Ok(rr.clone())
        })
    }

    fn append_reporter_representation(
        &self,
        representation: &NewReporterRepresentation,
    ) -> Result<ReporterRepresentation, LedgerError> {
        self.write(|state| {
            let rr_id = representation.reporter_resource_id;
            if !state.reporter_resources.contains_key(&rr_id) {
                return Err(LedgerError::NotFound(format!("reporter_resources {}", rr_id)));
            }
            let context = format!(
                "reporter_representations ({}, {}, {})",
                rr_id, representation.version, representation.generation
            );

            let generation = representation.generation;
            if let Some(((_, _, latest), _)) = state
                .reporter_representations
                .range((rr_id, generation, i64::MIN)..=(rr_id, generation, i64::MAX))
                .next_back()
            {
                if representation.version <= *latest {
                    return Err(LedgerError::Conflict(format!(
                        "{}: version must be greater than {}",
                        context, latest
                    )));
                }
            }
            if let Some(tx) = unique_transaction_id(&representation.transaction_id) {
                if !state.reporter_transaction_ids.insert(tx.to_string()) {
                    return Err(LedgerError::Conflict(format!(
                        "{}: transaction_id {} already used",
                        context, tx
                    )));
                }
            }

            let stored = ReporterRepresentation {
                reporter_resource_id: rr_id,
                version: representation.version,
                generation,
                data: representation.data.clone(),
                reporter_version: representation.reporter_version.clone(),
                common_version: representation.common_version,
                transaction_id: representation.transaction_id.clone(),
                tombstone: representation.tombstone,
                created_at: Utc::now(),
            };
            state
                .reporter_representations
                .insert((rr_id, generation, representation.version), stored.clone());
            Ok(stored)
        })
    }

    fn append_common_representation(
        &self,
        representation: &NewCommonRepresentation,
    ) -> Result<CommonRepresentation, LedgerError> {
        self.write(|state| {
            let resource_id = representation.resource_id;
            state.require_resource(resource_id)?;
            let context = format!(
                "common_representations ({}, {})",
                resource_id, representation.version
            );

            if let Some(((_, latest), _)) = state
                .common_representations
                .range((resource_id, i64::MIN)..=(resource_id, i64::MAX))
                .next_back()
            {
                if representation.version <= *latest {
                    return Err(LedgerError::Conflict(format!(
                        "{}: version must be greater than {}",
                        context, latest
                    )));
                }
            }
            if let Some(tx) = unique_transaction_id(&representation.transaction_id) {
                if !state.common_transaction_ids.insert(tx.to_string()) {
                    return Err(LedgerError::Conflict(format!(
                        "{}: transaction_id {} already used",
                        context, tx
                    )));
                }
            }

            let stored = CommonRepresentation {
                resource_id,
                version: representation.version,
                data: representation.data.clone(),
                reported_by_reporter_type: representation.reported_by_reporter_type.clone(),
                reported_by_reporter_instance: representation.reported_by_reporter_instance.clone(),
                transaction_id: representation.transaction_id.clone(),
                created_at: Utc::now(),
            };
            state
                .common_representations
                .insert((resource_id, representation.version), stored.clone());
            if let Some(owned) = state.owned.get_mut(&resource_id) {
                owned.common_versions.insert(representation.version);
            }
            Ok(stored)
        })
    }

    fn append_reference(
        &self,
        reference: &NewRepresentationReference,
    ) -> Result<RepresentationReference, LedgerError> {
        self.write(|state| state.insert_reference(reference))
    }

    fn find_all_sibling_references(
        &self,
        key: &ReferenceKey,
    ) -> Result<Vec<RepresentationReference>, LedgerError> {
        let state = self.lock()?;
        let owners: BTreeSet<Uuid> = state
            .references
            .values()
            .filter(|r| reference_matches(r, key))
            .map(|r| r.resource_id)
            .collect();

        let mut siblings: Vec<RepresentationReference> = state
            .references
            .values()
            .filter(|r| owners.contains(&r.resource_id))
            .cloned()
            .collect();
        siblings.sort_by(|a, b| {
            (
                a.resource_id,
                &a.reporter_type,
                &a.local_resource_id,
                &a.reporter_instance_id,
                a.representation_version,
                a.generation,
            )
                .cmp(&(
                    b.resource_id,
                    &b.reporter_type,
                    &b.local_resource_id,
                    &b.reporter_instance_id,
                    b.representation_version,
                    b.generation,
                ))
        });
        Ok(siblings)
    }

    fn update_representation_version(
        &self,
        filter: &RepresentationVersionUpdateFilter,
        representation_version: i64,
    ) -> Result<i64, LedgerError> {
        if representation_version < 0 {
            return Err(LedgerError::InvalidArgument(
                "representation_version cannot be negative".to_string(),
            ));
        }
        self.write(|state| {
            state.require_resource(filter.resource_id)?;

            let projected: Vec<RepresentationReference> = state
                .references
                .values()
                .filter(|r| r.resource_id == filter.resource_id)
                .map(|r| {
                    let mut row = r.clone();
                    if filter.matches(r) {
                        row.representation_version = representation_version;
                    }
                    row
                })
                .collect();
            for (i, a) in projected.iter().enumerate() {
                if projected[i + 1..].iter().any(|b| same_pointer(a, b)) {
                    return Err(LedgerError::Conflict(format!(
                        "representation_references of {}: version {} collides with an existing pointer",
                        filter.resource_id, representation_version
                    )));
                }
            }

            let mut updated = 0;
            for reference in state.references.values_mut() {
                if filter.matches(reference) {
                    reference.representation_version = representation_version;
                    updated += 1;
                }
            }
            Ok(updated)
        })
    }

    fn create_resource_with_references(
        &self,
        aggregate: &NewResourceWithReferences,
    ) -> Result<ResourceWithReferences, LedgerError> {
        let new_resource = aggregate.resource.as_ref().ok_or_else(|| {
            LedgerError::InvalidArgument("resource aggregate requires a resource".to_string())
        })?;

        self.write(|state| {
            let resource = state.insert_resource(new_resource)?;
            let mut representation_references =
                Vec::with_capacity(aggregate.representation_references.len());
            for reference in &aggregate.representation_references {
                let mut reference = reference.clone();
                reference.resource_id = resource.id;
                match state.insert_reference(&reference) {
                    Ok(row) => representation_references.push(row),
                    Err(e) => {
                        state.remove_resource(resource.id);
                        return Err(e);
                    }
                }
            }
            Ok(ResourceWithReferences {
                resource,
                representation_references,
            })
        })
    }
}
