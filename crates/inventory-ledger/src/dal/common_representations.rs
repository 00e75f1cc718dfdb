/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for the common representation ledger.
//!
//! Same rules as the reporter ledger, keyed by (resource_id, version). The resource row is the
//! lock that serialises appends for one resource.

use diesel::dsl::max;
use diesel::prelude::*;
use inventory_models::models::common_representations::{
    CommonRepresentation, NewCommonRepresentation,
};
use inventory_models::schema::{common_representations, resource};
use tracing::debug;
use uuid::Uuid;

use crate::dal::{Transaction, DAL};
use crate::error::{db_error, LedgerError};

/// Data Access Layer for CommonRepresentation operations.
pub struct CommonRepresentationsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl CommonRepresentationsDAL<'_> {
    /// Appends a converged snapshot.
    ///
    /// # Returns
    ///
    /// The stored row, `NotFound` when the resource does not exist, or `Conflict` when the version
    /// does not advance or the transaction id has been used before.
    pub fn append(
        &self,
        tx: Transaction<'_>,
        new_representation: &NewCommonRepresentation,
    ) -> Result<CommonRepresentation, LedgerError> {
        let context = format!(
            "common_representations ({}, {})",
            new_representation.resource_id, new_representation.version
        );

        self.dal.with_transaction(tx, |conn| {
            let owner: Option<Uuid> = resource::table
                .find(new_representation.resource_id)
                .select(resource::id)
                .for_update()
                .first(conn)
                .optional()
                .map_err(db_error(context.as_str()))?;
            if owner.is_none() {
                return Err(LedgerError::NotFound(format!(
                    "resource {}",
                    new_representation.resource_id
                )));
            }

            let latest: Option<i64> = common_representations::table
                .filter(common_representations::resource_id.eq(new_representation.resource_id))
                .select(max(common_representations::version))
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

            let created = diesel::insert_into(common_representations::table)
                .values(new_representation)
                .returning(CommonRepresentation::as_returning())
                .get_result(conn)
                .map_err(db_error(context.as_str()))?;
            debug!(
                resource_id = %created.resource_id,
                version = created.version,
                reported_by = %created.reported_by_reporter_type,
                "Appended common representation"
            );
            Ok(created)
        })
    }

    pub fn get(
        &self,
        resource_id: Uuid,
        version: i64,
    ) -> Result<Option<CommonRepresentation>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        common_representations::table
            .find((resource_id, version))
            .select(CommonRepresentation::as_select())
            .first(conn)
            .optional()
            .map_err(db_error("common_representations"))
    }

    pub fn latest_for_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<Option<CommonRepresentation>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        common_representations::table
            .filter(common_representations::resource_id.eq(resource_id))
            .order(common_representations::version.desc())
            .select(CommonRepresentation::as_select())
            .first(conn)
            .optional()
            .map_err(db_error(format!("common_representations of {}", resource_id)))
    }

    pub fn list_for_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<Vec<CommonRepresentation>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        common_representations::table
            .filter(common_representations::resource_id.eq(resource_id))
            .order(common_representations::version.asc())
            .select(CommonRepresentation::as_select())
            .load(conn)
            .map_err(db_error(format!("common_representations of {}", resource_id)))
    }
}
