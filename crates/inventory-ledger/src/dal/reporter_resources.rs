/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for reporter resources.
//!
//! ## Tombstone and resurrection
//!
//! Tombstoning marks the current generation deleted. Resurrecting a tombstoned row starts the
//! next generation: `generation` goes up by exactly one and `tombstone` is cleared in a single
//! conditional UPDATE, so two concurrent resurrections of the same row bump the generation once.
//! Resurrecting a live row changes nothing.

use chrono::Utc;
use diesel::prelude::*;
use inventory_models::models::reporter_resources::{
    NewReporterResource, ReporterResource, ReporterResourceKey,
};
use inventory_models::schema::reporter_resources;
use tracing::debug;
use uuid::Uuid;

use crate::dal::{Transaction, DAL};
use crate::error::{db_error, LedgerError};

/// Data Access Layer for ReporterResource operations.
pub struct ReporterResourcesDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl ReporterResourcesDAL<'_> {
    /// Inserts a new reporter resource.
    ///
    /// # Returns
    ///
    /// The stored row, `Conflict` when the natural key is taken, or `NotFound` when the owning
    /// resource does not exist.
    pub fn create(
        &self,
        tx: Transaction<'_>,
        new_reporter_resource: &NewReporterResource,
    ) -> Result<ReporterResource, LedgerError> {
        self.dal.with_transaction(tx, |conn| {
            let created = diesel::insert_into(reporter_resources::table)
                .values(new_reporter_resource)
                .returning(ReporterResource::as_returning())
                .get_result(conn)
                .map_err(db_error(format!(
                    "reporter_resources ({}, {}, {}, {})",
                    new_reporter_resource.local_resource_id,
                    new_reporter_resource.reporter_type,
                    new_reporter_resource.resource_type,
                    new_reporter_resource.reporter_instance_id
                )))?;
            debug!(reporter_resource_id = %created.id, resource_id = %created.resource_id, "Created reporter resource");
            Ok(created)
        })
    }

    /// Retrieves a reporter resource by its surrogate id.
    pub fn get(&self, reporter_resource_id: Uuid) -> Result<Option<ReporterResource>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        reporter_resources::table
            .find(reporter_resource_id)
            .select(ReporterResource::as_select())
            .first(conn)
            .optional()
            .map_err(db_error(format!("reporter_resources {}", reporter_resource_id)))
    }

    /// Retrieves a reporter resource by its natural key.
    pub fn get_by_key(&self, key: &ReporterResourceKey) -> Result<Option<ReporterResource>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        reporter_resources::table
            .filter(reporter_resources::local_resource_id.eq(&key.local_resource_id))
            .filter(reporter_resources::reporter_type.eq(&key.reporter_type))
            .filter(reporter_resources::resource_type.eq(&key.resource_type))
            .filter(reporter_resources::reporter_instance_id.eq(&key.reporter_instance_id))
            .select(ReporterResource::as_select())
            .first(conn)
            .optional()
            .map_err(db_error("reporter_resources (natural key)"))
    }

    /// Lists every reporter resource owned by a canonical resource, oldest first.
    pub fn list_for_resource(&self, resource_id: Uuid) -> Result<Vec<ReporterResource>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        reporter_resources::table
            .filter(reporter_resources::resource_id.eq(resource_id))
            .select(ReporterResource::as_select())
            .order((reporter_resources::created_at.asc(), reporter_resources::id.asc()))
            .load(conn)
            .map_err(db_error(format!("reporter_resources of resource {}", resource_id)))
    }

    /// Advances the latest representation version recorded on the row.
    ///
    /// # Returns
    ///
    /// The updated row, `NotFound` if it does not exist, or `Conflict` if `version` is lower than
    /// the stored one.
    pub fn update_representation_version(
        &self,
        tx: Transaction<'_>,
        reporter_resource_id: Uuid,
        version: i64,
    ) -> Result<ReporterResource, LedgerError> {
        self.dal.with_transaction(tx, |conn| {
            let updated = diesel::update(
                reporter_resources::table
                    .find(reporter_resource_id)
                    .filter(reporter_resources::representation_version.le(version)),
            )
            .set((
                reporter_resources::representation_version.eq(version),
                reporter_resources::updated_at.eq(Utc::now()),
            ))
            .returning(ReporterResource::as_returning())
            .get_result(conn)
            .optional()
            .map_err(db_error(format!("reporter_resources {}", reporter_resource_id)))?;

            match updated {
                Some(row) => Ok(row),
                None => match find_in(conn, reporter_resource_id)? {
                    None => Err(LedgerError::NotFound(format!(
                        "reporter_resources {}",
                        reporter_resource_id
                    ))),
                    Some(current) => Err(LedgerError::Conflict(format!(
                        "reporter_resources {}: representation_version {} is behind stored version {}",
                        reporter_resource_id, version, current.representation_version
                    ))),
                },
            }
        })
    }

    /// Marks the current generation deleted. Tombstoning an already tombstoned row is a no-op.
    pub fn tombstone(
        &self,
        tx: Transaction<'_>,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError> {
        self.dal.with_transaction(tx, |conn| {
            let row = diesel::update(reporter_resources::table.find(reporter_resource_id))
                .set((
                    reporter_resources::tombstone.eq(true),
                    reporter_resources::updated_at.eq(Utc::now()),
                ))
                .returning(ReporterResource::as_returning())
                .get_result(conn)
                .map_err(db_error(format!("reporter_resources {}", reporter_resource_id)))?;
            debug!(reporter_resource_id = %row.id, generation = row.generation, "Tombstoned reporter resource");
            Ok(row)
        })
    }

    /// Starts a new generation for a tombstoned row.
    ///
    /// # Returns
    ///
    /// The row after the transition, the unchanged row if it was not tombstoned, or `NotFound`.
    pub fn resurrect(
        &self,
        tx: Transaction<'_>,
        reporter_resource_id: Uuid,
    ) -> Result<ReporterResource, LedgerError> {
        self.dal.with_transaction(tx, |conn| {
            let resurrected = diesel::update(
                reporter_resources::table
                    .find(reporter_resource_id)
                    .filter(reporter_resources::tombstone.eq(true)),
            )
            .set((
                reporter_resources::generation.eq(reporter_resources::generation + 1),
                reporter_resources::tombstone.eq(false),
                reporter_resources::updated_at.eq(Utc::now()),
            ))
            .returning(ReporterResource::as_returning())
            .get_result(conn)
            .optional()
            .map_err(db_error(format!("reporter_resources {}", reporter_resource_id)))?;

            match resurrected {
                Some(row) => {
                    debug!(reporter_resource_id = %row.id, generation = row.generation, "Resurrected reporter resource");
                    Ok(row)
                }
                None => find_in(conn, reporter_resource_id)?.ok_or_else(|| {
                    LedgerError::NotFound(format!("reporter_resources {}", reporter_resource_id))
                }),
            }
        })
    }
}

fn find_in(
    conn: &mut PgConnection,
    reporter_resource_id: Uuid,
) -> Result<Option<ReporterResource>, LedgerError> {
    reporter_resources::table
        .find(reporter_resource_id)
        .select(ReporterResource::as_select())
        .first(conn)
        .optional()
        .map_err(db_error(format!("reporter_resources {}", reporter_resource_id)))
}
