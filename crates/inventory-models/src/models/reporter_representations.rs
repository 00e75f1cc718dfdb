/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Reporter Representations Module
//!
//! Immutable fact snapshots submitted by one reporter, keyed by
//! (`reporter_resource_id`, `version`, `generation`). Rows are append-only: logical deletion is
//! another row with `tombstone = true`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{normalize_transaction_id, require_max_length, require_non_negative, MAX_TRANSACTION_ID_LENGTH};

/// Represents a stored reporter representation.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::reporter_representations)]
#[diesel(primary_key(reporter_resource_id, version, generation))]
#[diesel(belongs_to(crate::models::reporter_resources::ReporterResource, foreign_key = reporter_resource_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReporterRepresentation {
    pub reporter_resource_id: Uuid,
    pub version: i64,
    pub generation: i64,
    /// Reporter-defined payload, opaque to the ledger
    pub data: Value,
    /// The reporter software's own version string
    pub reporter_version: Option<String>,
    /// Common representation version this snapshot was aligned with
    pub common_version: i64,
    /// Idempotency key, unique when present
    pub transaction_id: Option<String>,
    pub tombstone: bool,
    pub created_at: DateTime<Utc>,
}

/// Represents a new reporter representation.
#[derive(Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::reporter_representations)]
pub struct NewReporterRepresentation {
    pub reporter_resource_id: Uuid,
    pub version: i64,
    pub generation: i64,
    pub data: Value,
    pub reporter_version: Option<String>,
    pub common_version: i64,
    pub transaction_id: Option<String>,
    pub tombstone: bool,
}

impl NewReporterRepresentation {
    /// Creates a new `NewReporterRepresentation`.
    ///
    /// The caller chooses `version` and `generation`; the ledger only checks that they are
    /// unused and increasing. An empty `transaction_id` is treated as absent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reporter_resource_id: Uuid,
        version: i64,
        generation: i64,
        data: Value,
        reporter_version: Option<String>,
        common_version: i64,
        transaction_id: Option<String>,
        tombstone: bool,
    ) -> Result<Self, String> {
        if reporter_resource_id.is_nil() {
            return Err("Invalid reporter resource ID".to_string());
        }
        require_non_negative("version", version)?;
        require_non_negative("generation", generation)?;
        require_non_negative("common_version", common_version)?;
        if !data.is_object() {
            return Err("data must be a JSON object".to_string());
        }
        if let Some(v) = &reporter_version {
            require_max_length("reporter_version", v, MAX_TRANSACTION_ID_LENGTH)?;
        }
        let transaction_id = normalize_transaction_id(transaction_id)?;

        Ok(NewReporterRepresentation {
            reporter_resource_id,
            version,
            generation,
            data,
            reporter_version,
            common_version,
            transaction_id,
            tombstone,
        })
    }
}
