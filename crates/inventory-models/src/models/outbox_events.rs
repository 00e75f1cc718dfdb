/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Outbox Events Module
//!
//! Transactional outbox rows. An event is staged in the same transaction as the write it
//! describes; a relay outside this workspace reads and deletes them.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{require_max_length, require_non_empty};

const MAX_OUTBOX_FIELD_LENGTH: usize = 255;

/// Aggregate type used for resource events.
pub const RESOURCE_AGGREGATE_TYPE: &str = "inventory.resources";

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::outbox_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub operation: String,
    pub txid: Option<String>,
    pub payload: Value,
}

#[derive(Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::outbox_events)]
pub struct NewOutboxEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub operation: String,
    pub txid: Option<String>,
    pub payload: Value,
}

impl NewOutboxEvent {
    pub fn new(
        aggregate_type: String,
        aggregate_id: String,
        operation: String,
        txid: Option<String>,
        payload: Value,
    ) -> Result<Self, String> {
        for (field, value) in [
            ("aggregate_type", &aggregate_type),
            ("aggregate_id", &aggregate_id),
            ("operation", &operation),
        ] {
            require_non_empty(field, value)?;
            require_max_length(field, value, MAX_OUTBOX_FIELD_LENGTH)?;
        }
        let txid = txid.filter(|t| !t.is_empty());
        if let Some(t) = &txid {
            require_max_length("txid", t, MAX_OUTBOX_FIELD_LENGTH)?;
        }

        Ok(NewOutboxEvent {
            id: Uuid::now_v7(),
            aggregate_type,
            aggregate_id,
            operation,
            txid,
            payload,
        })
    }
}
