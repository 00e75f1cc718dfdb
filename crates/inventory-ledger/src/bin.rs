/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Inventory Ledger CLI application
//!
//! Loads settings, initialises logging and runs the requested schema command.

use inventory_ledger::cli::{commands, parse_cli, Commands};
use inventory_utils::config::Settings;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = parse_cli();

    // Load configuration
    let config = Settings::new(cli.config.clone())?;

    // Initialize logger
    inventory_utils::logging::init(&config.log.level, &config.log.format)?;

    match cli.command {
        Commands::Migrate { to } => commands::migrate(&config, to)?,
        Commands::RollbackLast => commands::rollback_last(&config)?,
        Commands::Verify => commands::verify(&config)?,
    }
    Ok(())
}
