/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Inventory Ledger
//!
//! `inventory-ledger` persists the inventory's record of resources: canonical resource identity,
//! the append-only reporter and common representation ledgers, and the reference index that maps
//! every reporter's natural key to its canonical resource. Multi-row writes are atomic, and schema
//! migrations are serialised across instances by a Postgres advisory lock.

pub mod cli;
pub mod dal;
pub mod db;
pub mod error;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod migrations;

pub use error::{ErrorKind, LedgerError};
pub use ledger::{InventoryLedger, ResourceLedger};
pub use memory::InMemoryLedger;
