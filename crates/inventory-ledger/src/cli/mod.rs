/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
/// Inventory Ledger CLI
///
/// Manages the ledger's database schema.
pub struct Cli {
    /// Optional configuration file layered over the built-in defaults
    #[arg(long, env = "INVENTORY_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Apply pending migrations
    Migrate {
        /// Stop after this migration ID (inclusive)
        #[arg(long)]
        to: Option<String>,
    },

    /// Revert the most recently applied migration
    RollbackLast,

    /// Print applied and pending migration IDs
    Verify,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
