/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for the reporter representation ledger.
//!
//! Append-only. The caller picks `version` and `generation`; an append is accepted only when
//! its version is strictly greater than every version already stored for the same reporter
//! resource and generation. The owning reporter resource row is locked for the duration of the
//! check so concurrent appends for one reporter resource serialise, while appends for different
//! reporter resources do not contend.

use diesel::dsl::max;
use diesel::prelude::*;
use inventory_models::models::reporter_representations::{
    NewReporterRepresentation, ReporterRepresentation,
};
use inventory_models::schema::{reporter_representations, reporter_resources};
use tracing::debug;
use uuid::Uuid;

use crate::dal::{Transaction, DAL};
use crate::error::{db_error, LedgerError};

/// Data Access Layer for ReporterRepresentation operations.
pub struct ReporterRepresentationsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl ReporterRepresentationsDAL<'_> {
    /// Appends a representation.
    ///
    /// # Returns
    ///
    /// The stored row, or:
    /// * `NotFound` when the reporter resource does not exist
    /// * `Conflict` when (reporter_resource_id, version, generation) is taken, the version does
    ///   not advance, or the transaction id has been used before
    pub fn append(
        &self,
        tx: Transaction<'_>,
        new_representation: &NewReporterRepresentation,
    ) -> Result<ReporterRepresentation, LedgerError> {
        let context = format!(
            "reporter_representations ({}, {}, {})",
            new_representation.reporter_resource_id,
            new_representation.version,
            new_representation.generation
        );

        self.dal.with_transaction(tx, |conn| {
            let owner: Option<Uuid> = reporter_resources::table
                .find(new_representation.reporter_resource_id)
                .select(reporter_resources::id)
                .for_update()
                .first(conn)
                .optional()
                .map_err(db_error(context.as_str()))?;
            if owner.is_none() {
                return Err(LedgerError::NotFound(format!(
                    "reporter_resources {}",
                    new_representation.reporter_resource_id
                )));
            }

            let latest: Option<i64> = reporter_representations::table
                .filter(
                    reporter_representations::reporter_resource_id
                        .eq(new_representation.reporter_resource_id),
                )
                .filter(reporter_representations::generation.eq(new_representation.generation))
                .select(max(reporter_representations::version))
                .first(conn)
                .map_err(db_error(context.as_str()))?;
            if let Some(latest) = latest {
                if new_representation.version <= latest {
                    return Err(LedgerError::Conflict(format!(
                        "{}: version must be greater than {}",
                        context, latest
                    )));
                }
            }

            let created = diesel::insert_into(reporter_representations::table)
                .values(new_representation)
                .returning(ReporterRepresentation::as_returning())
                .get_result(conn)
                .map_err(db_error(context.as_str()))?;
            debug!(
                reporter_resource_id = %created.reporter_resource_id,
                version = created.version,
                generation = created.generation,
                tombstone = created.tombstone,
                "Appended reporter representation"
            );
            Ok(created)
        })
    }

    /// Retrieves one representation by its full key.
    pub fn get(
        &self,
        reporter_resource_id: Uuid,
        version: i64,
        generation: i64,
    ) -> Result<Option<ReporterRepresentation>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        reporter_representations::table
            .find((reporter_resource_id, version, generation))
            .select(ReporterRepresentation::as_select())
            .first(conn)
            .optional()
            .map_err(db_error("reporter_representations"))
    }

    /// The newest representation of a reporter resource: highest generation, then highest version.
    pub fn latest_for(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<Option<ReporterRepresentation>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        reporter_representations::table
            .filter(reporter_representations::reporter_resource_id.eq(reporter_resource_id))
            .order((
                reporter_representations::generation.desc(),
                reporter_representations::version.desc(),
            ))
            .select(ReporterRepresentation::as_select())
            .first(conn)
            .optional()
            .map_err(db_error(format!(
                "reporter_representations of {}",
                reporter_resource_id
            )))
    }

    /// Full history of a reporter resource in (generation, version) order.
    pub fn list_for(
        &self,
        reporter_resource_id: Uuid,
    ) -> Result<Vec<ReporterRepresentation>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        reporter_representations::table
            .filter(reporter_representations::reporter_resource_id.eq(reporter_resource_id))
            .order((
                reporter_representations::generation.asc(),
                reporter_representations::version.asc(),
            ))
            .select(ReporterRepresentation::as_select())
            .load(conn)
            .map_err(db_error(format!(
                "reporter_representations of {}",
                reporter_resource_id
            )))
    }
}
