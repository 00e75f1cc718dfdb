/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer.
//!
//! [`DAL`] owns the connection pool and hands out one borrowing accessor per table. Every write
//! takes a [`Transaction`] that says whether the call opens its own transaction or joins one the
//! caller already holds.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

use crate::error::LedgerError;

mod common_representations;
mod outbox_events;
mod reporter_representations;
mod reporter_resources;
mod representation_references;
mod resource_with_references;
mod resources;

pub use common_representations::CommonRepresentationsDAL;
pub use outbox_events::OutboxEventsDAL;
pub use reporter_representations::ReporterRepresentationsDAL;
pub use reporter_resources::ReporterResourcesDAL;
pub use representation_references::RepresentationReferencesDAL;
pub use resource_with_references::ResourceWithReferencesDAL;
pub use resources::ResourcesDAL;

/// Transaction context of a write.
pub enum Transaction<'c> {
    /// Check out a pooled connection and run in a fresh transaction.
    Own,
    /// Run directly on the caller's connection, inside the transaction it already has open.
    /// No nested transaction or savepoint is opened; commit and rollback stay with the caller.
    Participate(&'c mut PgConnection),
}

#[derive(Clone)]
pub struct DAL {
    pub pool: Pool<ConnectionManager<PgConnection>>,
}

impl DAL {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        DAL { pool }
    }

    pub fn resources(&self) -> ResourcesDAL {
        ResourcesDAL { dal: self }
    }

    pub fn reporter_resources(&self) -> ReporterResourcesDAL {
        ReporterResourcesDAL { dal: self }
    }

    pub fn reporter_representations(&self) -> ReporterRepresentationsDAL {
        ReporterRepresentationsDAL { dal: self }
    }

    pub fn common_representations(&self) -> CommonRepresentationsDAL {
        CommonRepresentationsDAL { dal: self }
    }

    pub fn representation_references(&self) -> RepresentationReferencesDAL {
        RepresentationReferencesDAL { dal: self }
    }

    pub fn resource_with_references(&self) -> ResourceWithReferencesDAL {
        ResourceWithReferencesDAL { dal: self }
    }

    pub fn outbox_events(&self) -> OutboxEventsDAL {
        OutboxEventsDAL { dal: self }
    }

    /// Runs `f` atomically in the given transaction context.
    ///
    /// With [`Transaction::Own`] this commits on `Ok` and rolls back on `Err`. With
    /// [`Transaction::Participate`] `f` runs as part of the caller's transaction, which a failed
    /// statement leaves aborted until the caller rolls it back.
    pub fn with_transaction<T, F>(&self, tx: Transaction<'_>, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, LedgerError>,
    {
        match tx {
            Transaction::Own => {
                let mut pooled = self.pool.get()?;
                let conn: &mut PgConnection = &mut pooled;
                conn.transaction(f)
            }
            Transaction::Participate(conn) => f(conn),
        }
    }
}
