/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Resources Module
//!
//! The canonical identity of an inventory object.
//!
//! ## Core Data Model
//!
//! - `id`: Uuid - Time-ordered identifier, assigned once at creation and never changed
//! - `resource_type`: String - Resource kind, e.g. "host" (stored in the `type` column)
//! - `common_version`: i64 - Latest common representation version applicable to this resource
//! - `consistency_token`: String - Opaque replication token, empty until confirmed externally
//! - `created_at`, `updated_at`: DateTime<Utc>
//!
//! A resource owns every reporter resource, representation and reference row that points at it;
//! deleting the resource cascades to all of them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::representation_references::{NewRepresentationReference, RepresentationReference};
use super::{require_max_length, require_non_empty, require_non_negative, MAX_TYPE_LENGTH};

/// Represents a canonical resource row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::resource)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Resource {
    /// Time-ordered identifier
    pub id: Uuid,
    /// Resource kind
    pub resource_type: String,
    /// Latest common representation version
    pub common_version: i64,
    /// Opaque replication token
    pub consistency_token: String,
    /// Timestamp when the resource was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the resource was last updated
    pub updated_at: DateTime<Utc>,
}

/// Represents a new resource to be inserted.
///
/// `id` may be left unset; the writer then assigns a fresh v7 UUID before insertion.
#[derive(Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::resource)]
pub struct NewResource {
    pub id: Uuid,
    pub resource_type: String,
    pub common_version: i64,
    pub consistency_token: String,
}

impl NewResource {
    /// Creates a new `NewResource` with a generated time-ordered id and an empty consistency token.
    ///
    /// # Arguments
    ///
    /// * `resource_type` - The resource kind, at most 128 characters
    /// * `common_version` - Initial common version, must not be negative
    ///
    /// # Returns
    ///
    /// A `Result` containing the new resource, or an error message if validation fails.
    pub fn new(resource_type: String, common_version: i64) -> Result<Self, String> {
        Self::with_id(Uuid::now_v7(), resource_type, common_version)
    }

    /// Same as [`NewResource::new`] but with a caller-chosen id. A nil id is replaced by a
    /// generated one.
    pub fn with_id(id: Uuid, resource_type: String, common_version: i64) -> Result<Self, String> {
        require_non_empty("resource_type", &resource_type)?;
        require_max_length("resource_type", &resource_type, MAX_TYPE_LENGTH)?;
        require_non_negative("common_version", common_version)?;

        Ok(NewResource {
            id: if id.is_nil() { Uuid::now_v7() } else { id },
            resource_type,
            common_version,
            consistency_token: String::new(),
        })
    }
}

/// A resource together with the reference rows written alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceWithReferences {
    pub resource: Resource,
    pub representation_references: Vec<RepresentationReference>,
}

/// Input to the aggregate writer.
///
/// `resource` is optional so that a missing root can be rejected as an invalid argument rather
/// than being unrepresentable. Reference `resource_id`s are back-filled from the resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewResourceWithReferences {
    pub resource: Option<NewResource>,
    pub representation_references: Vec<NewRepresentationReference>,
}

impl NewResourceWithReferences {
    pub fn new(resource: NewResource, representation_references: Vec<NewRepresentationReference>) -> Self {
        NewResourceWithReferences {
            resource: Some(resource),
            representation_references,
        }
    }
}
