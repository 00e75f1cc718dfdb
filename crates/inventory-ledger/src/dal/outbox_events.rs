/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for the transactional outbox.

use diesel::prelude::*;
use inventory_models::models::outbox_events::{NewOutboxEvent, OutboxEvent};
use inventory_models::schema::outbox_events;
use tracing::debug;
use uuid::Uuid;

use crate::dal::{Transaction, DAL};
use crate::error::{db_error, LedgerError};

/// Data Access Layer for OutboxEvent operations.
pub struct OutboxEventsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl OutboxEventsDAL<'_> {
    /// Stages an event. Use [`Transaction::Participate`] to commit it with the write it describes.
    pub fn stage(&self, tx: Transaction<'_>, event: &NewOutboxEvent) -> Result<OutboxEvent, LedgerError> {
        self.dal.with_transaction(tx, |conn| {
            let staged = diesel::insert_into(outbox_events::table)
                .values(event)
                .returning(OutboxEvent::as_returning())
                .get_result(conn)
                .map_err(db_error(format!("outbox_events {}", event.id)))?;
            debug!(
                event_id = %staged.id,
                aggregate_type = %staged.aggregate_type,
                operation = %staged.operation,
                "Staged outbox event"
            );
            Ok(staged)
        })
    }

    /// Events of one aggregate, oldest first (ids are time-ordered).
    pub fn list_for_aggregate(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<OutboxEvent>, LedgerError> {
        let conn = &mut self.dal.pool.get()?;
        outbox_events::table
            .filter(outbox_events::aggregate_type.eq(aggregate_type))
            .filter(outbox_events::aggregate_id.eq(aggregate_id))
            .order(outbox_events::id.asc())
            .select(OutboxEvent::as_select())
            .load(conn)
            .map_err(db_error(format!("outbox_events of {}/{}", aggregate_type, aggregate_id)))
    }

    pub fn delete(&self, tx: Transaction<'_>, event_id: Uuid) -> Result<usize, LedgerError> {
        self.dal.with_transaction(tx, |conn| {
            diesel::delete(outbox_events::table.find(event_id))
                .execute(conn)
                .map_err(db_error(format!("outbox_events {}", event_id)))
        })
    }
}
