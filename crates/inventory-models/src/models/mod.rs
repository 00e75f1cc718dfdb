/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Models
//!
//! One module per ledger table. Each module exposes a queryable row struct and an insertable
//! `New*` struct whose `new` constructor enforces the column limits below before anything
//! reaches the database.

pub mod common_representations;
pub mod outbox_events;
pub mod reporter_representations;
pub mod reporter_resources;
pub mod representation_references;
pub mod resources;

/// Maximum length of `local_resource_id` and `reporter_instance_id` columns.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;
/// Maximum length of `type`, `resource_type` and `reporter_type` columns.
pub const MAX_TYPE_LENGTH: usize = 128;
/// Maximum length of `api_href` and `console_href`.
pub const MAX_HREF_LENGTH: usize = 512;
/// Maximum length of `transaction_id` and `reporter_version`.
pub const MAX_TRANSACTION_ID_LENGTH: usize = 128;
/// Maximum length of the consistency token.
pub const MAX_CONSISTENCY_TOKEN_LENGTH: usize = 1024;

/// Reporter type used by the common (converged) representation pseudo-reporter.
pub const INVENTORY_REPORTER_TYPE: &str = "inventory";

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    Ok(())
}

pub(crate) fn require_max_length(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{} exceeds maximum length of {}", field, max));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: i64) -> Result<(), String> {
    if value < 0 {
        return Err(format!("{} cannot be negative", field));
    }
    Ok(())
}

/// Empty transaction ids are stored as NULL so the partial unique index ignores them.
pub(crate) fn normalize_transaction_id(transaction_id: Option<String>) -> Result<Option<String>, String> {
    match transaction_id {
        Some(id) if id.is_empty() => Ok(None),
        Some(id) => {
            require_max_length("transaction_id", &id, MAX_TRANSACTION_ID_LENGTH)?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}
