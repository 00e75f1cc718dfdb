/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for the canonical resource registry.
//!
//! A resource id is assigned once, at creation. The only mutable columns are the common version
//! pointer and the consistency token, which is written by the external replication process and
//! stored verbatim (last write wins).

use chrono::Utc;
use diesel::prelude::*;
use inventory_models::models::resources::{NewResource, Resource};
use inventory_models::models::MAX_CONSISTENCY_TOKEN_LENGTH;
use inventory_models::schema::resource;
use tracing::debug;
use uuid::Uuid;

use crate::dal::{Transaction, DAL};
use crate::error::{db_error, LedgerError};

/// Data Access Layer for Resource operations.
pub struct ResourcesDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl ResourcesDAL<'_> {
    /// Inserts a new resource. A nil id is replaced by a fresh v7 UUID.
    ///
    /// # Returns
    ///
    /// The stored resource, or `InvalidArgument` when a resource with the same id already exists.
    pub fn create(&self, tx: Transaction<'_>, new_resource: &NewResource) -> Result<Resource, LedgerError> {
        let mut new_resource = new_resource.clone();
        if new_resource.id.is_nil() {
            new_resource.id = Uuid::now_v7();
        }

        self.dal.with_transaction(tx, |conn| {
            let created = diesel::insert_into(resource::table)
                .values(&new_resource)
                .returning(Resource::as_returning())
                .get_result(conn)
                .map_err(|e| match LedgerError::from_diesel("resource", e) {
                    LedgerError::Conflict(_) => LedgerError::InvalidArgument(format!(
                        "resource {} already exists",
                        new_resource.id
                    )),
                    other => other,
                })?;
            debug!(resource_id = %created.id, resource_type = %created.resource_type, "Created resource");
            Ok(created)
        })
    }

    /// Retrieves a resource by id.
    pub fn get(&self, resource_id: Uuid) -> Result<Option<Resource>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        resource::table
            .find(resource_id)
            .select(Resource::as_select())
            .first(conn)
            .optional()
            .map_err(db_error(format!("resource {}", resource_id)))
    }

    /// Sets the consistency token unconditionally.
    ///
    /// # Returns
    ///
    /// `NotFound` if the resource does not exist, `InvalidArgument` if the token is too long.
    pub fn update_consistency_token(
        &self,
        tx: Transaction<'_>,
        resource_id: Uuid,
        token: &str,
    ) -> Result<(), LedgerError> {
        if token.chars().count() > MAX_CONSISTENCY_TOKEN_LENGTH {
            return Err(LedgerError::InvalidArgument(format!(
                "consistency_token exceeds maximum length of {}",
                MAX_CONSISTENCY_TOKEN_LENGTH
            )));
        }

        self.dal.with_transaction(tx, |conn| {
            let updated = diesel::update(resource::table.find(resource_id))
                .set((
                    resource::consistency_token.eq(token),
                    resource::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(db_error(format!("resource {}", resource_id)))?;

            if updated == 0 {
                return Err(LedgerError::NotFound(format!("resource {}", resource_id)));
            }
            debug!(resource_id = %resource_id, "Updated consistency token");
            Ok(())
        })
    }

    /// Moves the resource's common version pointer.
    pub fn update_common_version(
        &self,
        tx: Transaction<'_>,
        resource_id: Uuid,
        common_version: i64,
    ) -> Result<Resource, LedgerError> {
        if common_version < 0 {
            return Err(LedgerError::InvalidArgument(
                "common_version cannot be negative".to_string(),
            ));
        }

        self.dal.with_transaction(tx, |conn| {
            diesel::update(resource::table.find(resource_id))
                .set((
                    resource::common_version.eq(common_version),
                    resource::updated_at.eq(Utc::now()),
                ))
                .returning(Resource::as_returning())
                .get_result(conn)
                .map_err(db_error(format!("resource {}", resource_id)))
        })
    }

    /// Hard-deletes a resource. Every owned row goes with it through the cascading foreign keys.
    ///
    /// # Returns
    ///
    /// The number of resource rows removed (0 or 1).
    pub fn delete(&self, tx: Transaction<'_>, resource_id: Uuid) -> Result<usize, LedgerError> {
        self.dal.with_transaction(tx, |conn| {
            diesel::delete(resource::table.find(resource_id))
                .execute(conn)
                .map_err(db_error(format!("resource {}", resource_id)))
        })
    }
}
