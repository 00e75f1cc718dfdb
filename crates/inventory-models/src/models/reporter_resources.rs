/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Reporter Resources Module
//!
//! A reporter's durable handle on a canonical resource, addressed by the natural key
//! (`local_resource_id`, `reporter_type`, `resource_type`, `reporter_instance_id`).
//!
//! ## Lifecycle
//!
//! - Created on the first report, with `representation_version = 0`, `generation = 0`.
//! - `tombstone` is set on logical deletion; the row itself is kept.
//! - A tombstoned row that is reported again is resurrected: `generation` increments by one
//!   and `tombstone` is cleared. Tombstones are therefore scoped to a generation.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

pub use super::representation_references::ReferenceKey as ReporterResourceKey;
use super::{
    require_max_length, require_non_empty, MAX_HREF_LENGTH, MAX_IDENTIFIER_LENGTH, MAX_TYPE_LENGTH,
};

/// Represents a reporter resource row.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::reporter_resources)]
#[diesel(belongs_to(crate::models::resources::Resource, foreign_key = resource_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReporterResource {
    /// Surrogate identifier
    pub id: Uuid,
    /// Identifier the reporter uses for the resource
    pub local_resource_id: String,
    /// Reporter kind, e.g. "hbi"
    pub reporter_type: String,
    /// Resource kind
    pub resource_type: String,
    /// Reporter installation
    pub reporter_instance_id: String,
    /// Owning canonical resource
    pub resource_id: Uuid,
    pub api_href: String,
    pub console_href: Option<String>,
    /// Latest representation version recorded for this reporter resource
    pub representation_version: i64,
    /// Incremented on every tombstone to resurrect transition
    pub generation: i64,
    /// Logical deletion marker for the current generation
    pub tombstone: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReporterResource {
    pub fn key(&self) -> ReporterResourceKey {
        ReporterResourceKey {
            local_resource_id: self.local_resource_id.clone(),
            reporter_type: self.reporter_type.clone(),
            resource_type: self.resource_type.clone(),
            reporter_instance_id: self.reporter_instance_id.clone(),
        }
    }
}

/// Represents a new reporter resource.
#[derive(Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::reporter_resources)]
pub struct NewReporterResource {
    pub id: Uuid,
    pub local_resource_id: String,
    pub reporter_type: String,
    pub resource_type: String,
    pub reporter_instance_id: String,
    pub resource_id: Uuid,
    pub api_href: String,
    pub console_href: Option<String>,
    pub representation_version: i64,
    pub generation: i64,
    pub tombstone: bool,
}

impl NewReporterResource {
    /// Creates a new `NewReporterResource` at version 0, generation 0.
    ///
    /// # Arguments
    ///
    /// * `key` - The reporter's natural key; every component is required
    /// * `resource_id` - Owning canonical resource
    /// * `api_href` - API link, empty or an absolute URL
    /// * `console_href` - Optional console link, an absolute URL when present
    ///
    /// # Returns
    ///
    /// A `Result` containing the new reporter resource, or an error message if validation fails.
    pub fn new(
        key: ReporterResourceKey,
        resource_id: Uuid,
        api_href: String,
        console_href: Option<String>,
    ) -> Result<Self, String> {
        validate_key(&key)?;
        if resource_id.is_nil() {
            return Err("Invalid resource ID".to_string());
        }
        validate_optional_url("api_href", &api_href)?;
        let console_href = console_href.filter(|href| !href.is_empty());
        if let Some(href) = &console_href {
            validate_optional_url("console_href", href)?;
        }

        Ok(NewReporterResource {
            id: Uuid::now_v7(),
            local_resource_id: key.local_resource_id,
            reporter_type: key.reporter_type,
            resource_type: key.resource_type,
            reporter_instance_id: key.reporter_instance_id,
            resource_id,
            api_href,
            console_href,
            representation_version: 0,
            generation: 0,
            tombstone: false,
        })
    }
}

fn validate_key(key: &ReporterResourceKey) -> Result<(), String> {
    require_non_empty("local_resource_id", &key.local_resource_id)?;
    require_max_length("local_resource_id", &key.local_resource_id, MAX_IDENTIFIER_LENGTH)?;
    require_non_empty("reporter_type", &key.reporter_type)?;
    require_max_length("reporter_type", &key.reporter_type, MAX_TYPE_LENGTH)?;
    require_non_empty("resource_type", &key.resource_type)?;
    require_max_length("resource_type", &key.resource_type, MAX_TYPE_LENGTH)?;
    require_non_empty("reporter_instance_id", &key.reporter_instance_id)?;
    require_max_length(
        "reporter_instance_id",
        &key.reporter_instance_id,
        MAX_IDENTIFIER_LENGTH,
    )
}

fn validate_optional_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    require_max_length(field, value, MAX_HREF_LENGTH)?;
    Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", field, e))?;
    Ok(())
}
