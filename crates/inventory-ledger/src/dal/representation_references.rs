/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for the representation reference index.
//!
//! Reference rows are the only mutable "current pointer" state; advancing a pointer touches
//! `representation_version` and nothing else.

use diesel::prelude::*;
use inventory_models::models::representation_references::{
    NewRepresentationReference, ReferenceKey, RepresentationReference,
    RepresentationVersionUpdateFilter,
};
use inventory_models::schema::{representation_references, resource};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dal::{Transaction, DAL};
use crate::error::{db_error, LedgerError};

/// Data Access Layer for RepresentationReference operations.
pub struct RepresentationReferencesDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl RepresentationReferencesDAL<'_> {
    /// Inserts a reference row. `resource_id` must already be set.
    ///
    /// # Returns
    ///
    /// The stored row, `InvalidArgument` for a nil resource id, `NotFound` when the resource does
    /// not exist, or `Conflict` when the same pointer already exists for the resource.
    pub fn append(
        &self,
        tx: Transaction<'_>,
        new_reference: &NewRepresentationReference,
    ) -> Result<RepresentationReference, LedgerError> {
        if new_reference.resource_id.is_nil() {
            return Err(LedgerError::InvalidArgument(
                "representation reference requires a resource_id".to_string(),
            ));
        }

        self.dal.with_transaction(tx, |conn| {
            let created = diesel::insert_into(representation_references::table)
                .values(new_reference)
                .returning(RepresentationReference::as_returning())
                .get_result(conn)
                .map_err(db_error(format!(
                    "representation_references ({}, {}, {}, {}, {}, {})",
                    new_reference.resource_id,
                    new_reference.reporter_type,
                    new_reference.resource_type,
                    new_reference.reporter_instance_id,
                    new_reference.representation_version,
                    new_reference.generation
                )))?;
            debug!(
                resource_id = %created.resource_id,
                reporter_type = %created.reporter_type,
                representation_version = created.representation_version,
                "Appended representation reference"
            );
            Ok(created)
        })
    }

    /// Returns every reference row of the resource that owns `key`.
    ///
    /// The owning resource is resolved from the reference rows carrying `key`. No match yields an
    /// empty vector. Rows come back ordered by reporter type, local id, version and generation.
    pub fn find_all_sibling_references(
        &self,
        key: &ReferenceKey,
    ) -> Result<Vec<RepresentationReference>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;

        let owners: Vec<Uuid> = representation_references::table
            .filter(representation_references::local_resource_id.eq(&key.local_resource_id))
            .filter(representation_references::reporter_type.eq(&key.reporter_type))
            .filter(representation_references::resource_type.eq(&key.resource_type))
            .filter(representation_references::reporter_instance_id.eq(&key.reporter_instance_id))
            .select(representation_references::resource_id)
            .distinct()
            .load(conn)
            .map_err(db_error("representation_references (identifying tuple)"))?;

        match owners.len() {
            0 => return Ok(Vec::new()),
            1 => {}
            n => warn!(
                local_resource_id = %key.local_resource_id,
                reporter_type = %key.reporter_type,
                owners = n,
                "Identifying tuple resolves to more than one resource; returning references of all of them"
            ),
        }

        representation_references::table
            .filter(representation_references::resource_id.eq_any(&owners))
            .order((
                representation_references::resource_id.asc(),
                representation_references::reporter_type.asc(),
                representation_references::local_resource_id.asc(),
                representation_references::reporter_instance_id.asc(),
                representation_references::representation_version.asc(),
                representation_references::generation.asc(),
            ))
            .select(RepresentationReference::as_select())
            .load(conn)
            .map_err(db_error("representation_references (siblings)"))
    }

    /// Every reference row of one resource, in insertion order.
    pub fn list_for_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<Vec<RepresentationReference>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        representation_references::table
            .filter(representation_references::resource_id.eq(resource_id))
            .order(representation_references::id.asc())
            .select(RepresentationReference::as_select())
            .load(conn)
            .map_err(db_error(format!("representation_references of {}", resource_id)))
    }

    /// Sets `representation_version` on every row matching `filter`.
    ///
    /// # Returns
    ///
    /// The number of rows updated, or `NotFound` when the resource does not exist. A resource
    /// with no matching rows yields 0.
    pub fn update_representation_version(
        &self,
        tx: Transaction<'_>,
        filter: &RepresentationVersionUpdateFilter,
        representation_version: i64,
    ) -> Result<i64, LedgerError> {
        if representation_version < 0 {
            return Err(LedgerError::InvalidArgument(
                "representation_version cannot be negative".to_string(),
            ));
        }
        let context = format!("representation_references of {}", filter.resource_id);

        self.dal.with_transaction(tx, |conn| {
            let exists: Option<Uuid> = resource::table
                .find(filter.resource_id)
                .select(resource::id)
                .first(conn)
                .optional()
                .map_err(db_error(context.as_str()))?;
            if exists.is_none() {
                return Err(LedgerError::NotFound(format!("resource {}", filter.resource_id)));
            }

            let mut target = representation_references::table
                .filter(representation_references::resource_id.eq(filter.resource_id))
                .into_boxed();
            if let Some(reporter_type) = &filter.reporter_type {
                target = target.filter(representation_references::reporter_type.eq(reporter_type));
            }
            if let Some(local_resource_id) = &filter.local_resource_id {
                target = target
                    .filter(representation_references::local_resource_id.eq(local_resource_id));
            }
            let ids: Vec<i64> = target
                .select(representation_references::id)
                .load(conn)
                .map_err(db_error(context.as_str()))?;

            let updated = diesel::update(
                representation_references::table
                    .filter(representation_references::id.eq_any(&ids)),
            )
            .set(representation_references::representation_version.eq(representation_version))
            .execute(conn)
            .map_err(db_error(context.as_str()))?;

            debug!(
                resource_id = %filter.resource_id,
                reporter_type = ?filter.reporter_type,
                representation_version,
                updated,
                "Advanced representation references"
            );
            Ok(updated as i64)
        })
    }

    /// Advances the common view's pointer of a resource.
    pub fn update_common_representation_version(
        &self,
        tx: Transaction<'_>,
        resource_id: Uuid,
        representation_version: i64,
    ) -> Result<i64, LedgerError> {
        self.update_representation_version(
            tx,
            &RepresentationVersionUpdateFilter::common(resource_id),
            representation_version,
        )
    }

    /// Advances one reporter's pointer of a resource.
    pub fn update_reporter_representation_version(
        &self,
        tx: Transaction<'_>,
        resource_id: Uuid,
        reporter_type: &str,
        local_resource_id: &str,
        representation_version: i64,
    ) -> Result<i64, LedgerError> {
        self.update_representation_version(
            tx,
            &RepresentationVersionUpdateFilter::reporter(resource_id, reporter_type, local_resource_id),
            representation_version,
        )
    }
}
