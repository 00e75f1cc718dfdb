/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Transactional aggregate writer: a resource and its initial reference rows, all or nothing.

use diesel::PgConnection;
use inventory_models::models::resources::{NewResourceWithReferences, ResourceWithReferences};
use tracing::debug;

use crate::dal::{Transaction, DAL};
use crate::error::LedgerError;

/// Data Access Layer for the resource aggregate.
pub struct ResourceWithReferencesDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl ResourceWithReferencesDAL<'_> {
    /// Inserts the resource, then each reference with `resource_id` set to the resource's id.
    ///
    /// A nil resource id is replaced by a fresh v7 UUID. An empty reference list is valid.
    /// With [`Transaction::Participate`] the rows are written in the caller's transaction without
    /// nesting; on failure the error is returned and the caller must roll back.
    ///
    /// # Returns
    ///
    /// The stored aggregate, or `InvalidArgument` when no resource is given.
    pub fn create(
        &self,
        tx: Transaction<'_>,
        aggregate: &NewResourceWithReferences,
    ) -> Result<ResourceWithReferences, LedgerError> {
        let new_resource = aggregate.resource.as_ref().ok_or_else(|| {
            LedgerError::InvalidArgument("resource aggregate requires a resource".to_string())
        })?;

        self.dal.with_transaction(tx, |conn: &mut PgConnection| {
            let resource = self
                .dal
                .resources()
                .create(Transaction::Participate(&mut *conn), new_resource)?;

            let mut representation_references =
                Vec::with_capacity(aggregate.representation_references.len());
            for reference in &aggregate.representation_references {
                let mut reference = reference.clone();
                reference.resource_id = resource.id;
                representation_references.push(
                    self.dal
                        .representation_references()
                        .append(Transaction::Participate(&mut *conn), &reference)?,
                );
            }

            debug!(
                resource_id = %resource.id,
                references = representation_references.len(),
                "Created resource aggregate"
            );
            Ok(ResourceWithReferences {
                resource,
                representation_references,
            })
        })
    }
}
