/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Representation References Module
//!
//! Thin pointer rows from a canonical resource to one (reporter-or-common, version, generation)
//! snapshot. They carry no payload; `representation_version` is the only column that is ever
//! advanced after insertion.
//!
//! Empty `reporter_instance_id` (and an `inventory` reporter type) denote the common view.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    require_max_length, require_non_empty, require_non_negative, INVENTORY_REPORTER_TYPE,
    MAX_IDENTIFIER_LENGTH, MAX_TYPE_LENGTH,
};

/// Represents a reference row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::representation_references)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RepresentationReference {
    /// Surrogate key
    pub id: i64,
    /// Owning canonical resource
    pub resource_id: Uuid,
    pub local_resource_id: String,
    pub reporter_type: String,
    pub resource_type: String,
    pub reporter_instance_id: String,
    /// Version of the representation this row currently points at
    pub representation_version: i64,
    pub generation: i64,
    pub tombstone: bool,
}

/// Represents a new reference row.
///
/// `resource_id` may be nil when the row is handed to the aggregate writer, which back-fills it.
#[derive(Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::representation_references)]
pub struct NewRepresentationReference {
    pub resource_id: Uuid,
    pub local_resource_id: String,
    pub reporter_type: String,
    pub resource_type: String,
    pub reporter_instance_id: String,
    pub representation_version: i64,
    pub generation: i64,
    pub tombstone: bool,
}

impl NewRepresentationReference {
    /// Creates a new `NewRepresentationReference`.
    ///
    /// # Arguments
    ///
    /// * `resource_id` - Owning resource, or nil to let the aggregate writer fill it
    /// * `key` - Identifying tuple of the reporter (or the common view)
    /// * `representation_version` - Version pointed at, must not be negative
    /// * `generation` - Generation pointed at, must not be negative
    /// * `tombstone` - Whether the pointed-at snapshot is a deletion marker
    ///
    /// # Returns
    ///
    /// A `Result` containing the new reference, or an error message if validation fails.
    pub fn new(
        resource_id: Uuid,
        key: ReferenceKey,
        representation_version: i64,
        generation: i64,
        tombstone: bool,
    ) -> Result<Self, String> {
        require_non_empty("local_resource_id", &key.local_resource_id)?;
        require_max_length("local_resource_id", &key.local_resource_id, MAX_IDENTIFIER_LENGTH)?;
        require_non_empty("resource_type", &key.resource_type)?;
        require_max_length("resource_type", &key.resource_type, MAX_TYPE_LENGTH)?;
        require_max_length("reporter_type", &key.reporter_type, MAX_TYPE_LENGTH)?;
        require_max_length(
            "reporter_instance_id",
            &key.reporter_instance_id,
            MAX_IDENTIFIER_LENGTH,
        )?;
        require_non_negative("representation_version", representation_version)?;
        require_non_negative("generation", generation)?;

        Ok(NewRepresentationReference {
            resource_id,
            local_resource_id: key.local_resource_id,
            reporter_type: key.reporter_type,
            resource_type: key.resource_type,
            reporter_instance_id: key.reporter_instance_id,
            representation_version,
            generation,
            tombstone,
        })
    }

    /// The identifying tuple of this row.
    pub fn key(&self) -> ReferenceKey {
        ReferenceKey {
            local_resource_id: self.local_resource_id.clone(),
            reporter_type: self.reporter_type.clone(),
            resource_type: self.resource_type.clone(),
            reporter_instance_id: self.reporter_instance_id.clone(),
        }
    }
}

impl RepresentationReference {
    /// The identifying tuple of this row.
    pub fn key(&self) -> ReferenceKey {
        ReferenceKey {
            local_resource_id: self.local_resource_id.clone(),
            reporter_type: self.reporter_type.clone(),
            resource_type: self.resource_type.clone(),
            reporter_instance_id: self.reporter_instance_id.clone(),
        }
    }
}

/// (`local_resource_id`, `reporter_type`, `resource_type`, `reporter_instance_id`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceKey {
    pub local_resource_id: String,
    pub reporter_type: String,
    pub resource_type: String,
    pub reporter_instance_id: String,
}

impl ReferenceKey {
    pub fn new(
        local_resource_id: impl Into<String>,
        reporter_type: impl Into<String>,
        resource_type: impl Into<String>,
        reporter_instance_id: impl Into<String>,
    ) -> Self {
        ReferenceKey {
            local_resource_id: local_resource_id.into(),
            reporter_type: reporter_type.into(),
            resource_type: resource_type.into(),
            reporter_instance_id: reporter_instance_id.into(),
        }
    }
}

/// Selects the reference rows whose `representation_version` is advanced.
///
/// `resource_id` is mandatory; the optional fields narrow the update further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentationVersionUpdateFilter {
    pub resource_id: Uuid,
    pub reporter_type: Option<String>,
    pub local_resource_id: Option<String>,
}

impl RepresentationVersionUpdateFilter {
    /// Every reference row of the resource.
    pub fn for_resource(resource_id: Uuid) -> Self {
        RepresentationVersionUpdateFilter {
            resource_id,
            reporter_type: None,
            local_resource_id: None,
        }
    }

    /// The common view's row(s) of the resource.
    pub fn common(resource_id: Uuid) -> Self {
        Self::for_resource(resource_id).with_reporter_type(INVENTORY_REPORTER_TYPE)
    }

    /// One reporter's row(s) of the resource.
    pub fn reporter(resource_id: Uuid, reporter_type: &str, local_resource_id: &str) -> Self {
        Self::for_resource(resource_id)
            .with_reporter_type(reporter_type)
            .with_local_resource_id(local_resource_id)
    }

    pub fn with_reporter_type(mut self, reporter_type: &str) -> Self {
        self.reporter_type = Some(reporter_type.to_string());
        self
    }

    pub fn with_local_resource_id(mut self, local_resource_id: &str) -> Self {
        self.local_resource_id = Some(local_resource_id.to_string());
        self
    }

    /// Whether a reference row falls under this filter.
    pub fn matches(&self, reference: &RepresentationReference) -> bool {
        reference.resource_id == self.resource_id
            && self
                .reporter_type
                .as_deref()
                .map_or(true, |t| reference.reporter_type == t)
            && self
                .local_resource_id
                .as_deref()
                .map_or(true, |l| reference.local_resource_id == l)
    }
}
