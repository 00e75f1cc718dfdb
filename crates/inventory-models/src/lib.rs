/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Row types, insert types and the diesel schema for the inventory ledger tables.
//!
//! The SQL migrations that create these tables live in this crate's `migrations/` directory
//! and are embedded into the ledger crate at build time.

pub mod models;
pub mod schema;
