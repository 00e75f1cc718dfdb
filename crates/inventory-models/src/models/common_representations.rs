/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Common Representations Module
//!
//! Immutable converged snapshots of a resource, keyed by (`resource_id`, `version`).
//! The `reported_by_*` columns record which submission triggered the snapshot and are
//! informational only.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{
    normalize_transaction_id, require_max_length, require_non_negative, MAX_IDENTIFIER_LENGTH,
    MAX_TYPE_LENGTH,
};

/// Represents a stored common representation.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::common_representations)]
#[diesel(primary_key(resource_id, version))]
#[diesel(belongs_to(crate::models::resources::Resource, foreign_key = resource_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommonRepresentation {
    pub resource_id: Uuid,
    pub version: i64,
    pub data: Value,
    pub reported_by_reporter_type: String,
    pub reported_by_reporter_instance: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Represents a new common representation.
#[derive(Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::common_representations)]
pub struct NewCommonRepresentation {
    pub resource_id: Uuid,
    pub version: i64,
    pub data: Value,
    pub reported_by_reporter_type: String,
    pub reported_by_reporter_instance: String,
    pub transaction_id: Option<String>,
}

impl NewCommonRepresentation {
    /// Creates a new `NewCommonRepresentation`.
    ///
    /// # Arguments
    ///
    /// * `resource_id` - Owning canonical resource
    /// * `version` - Caller-chosen version, strictly greater than any stored one
    /// * `data` - Converged payload (a JSON object)
    /// * `reported_by_reporter_type` / `reported_by_reporter_instance` - Provenance
    /// * `transaction_id` - Optional idempotency key; empty is treated as absent
    pub fn new(
        resource_id: Uuid,
        version: i64,
        data: Value,
        reported_by_reporter_type: String,
        reported_by_reporter_instance: String,
        transaction_id: Option<String>,
    ) -> Result<Self, String> {
        if resource_id.is_nil() {
            return Err("Invalid resource ID".to_string());
        }
        require_non_negative("version", version)?;
        if !data.is_object() {
            return Err("data must be a JSON object".to_string());
        }
        require_max_length(
            "reported_by_reporter_type",
            &reported_by_reporter_type,
            MAX_TYPE_LENGTH,
        )?;
        require_max_length(
            "reported_by_reporter_instance",
            &reported_by_reporter_instance,
            MAX_IDENTIFIER_LENGTH,
        )?;
        let transaction_id = normalize_transaction_id(transaction_id)?;

        Ok(NewCommonRepresentation {
            resource_id,
            version,
            data,
            reported_by_reporter_type,
            reported_by_reporter_instance,
            transaction_id,
        })
    }
}
