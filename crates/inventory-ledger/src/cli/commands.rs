/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::db;
use crate::error::LedgerError;
use crate::migrations::{EmbeddedMigrationEngine, MigrationRunner};
use inventory_utils::config::Settings;
use inventory_utils::logging::prelude::*;

/// Chooses the migration target: the command line wins over configuration.
pub fn effective_target(cli_target: Option<String>, settings: &Settings) -> Option<String> {
    cli_target
        .or_else(|| settings.migrations.target.clone())
        .filter(|target| !target.trim().is_empty())
}

/// The migration runner opens its own connection, so only the URL is resolved here.
fn database_url(config: &Settings) -> Result<String, LedgerError> {
    let database_url = db::database_url(&config.database.url, &config.database.name)?;
    debug!("Resolved database {}", config.database.name);
    Ok(database_url)
}

/// Applies pending migrations, optionally stopping at `target`.
pub fn migrate(config: &Settings, target: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url(config)?;
    let runner = MigrationRunner::new(EmbeddedMigrationEngine);

    let applied = match effective_target(target, config) {
        Some(target) => {
            info!("Running pending database migrations up to {}", target);
            runner.run_to(&database_url, &target)?
        }
        None => {
            info!("Running pending database migrations");
            runner.run(&database_url)?
        }
    };

    if applied.is_empty() {
        info!("Database schema already up to date");
    } else {
        info!("Database migrations completed successfully: {}", applied.join(", "));
    }
    Ok(())
}

/// Reverts the last applied migration.
pub fn rollback_last(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url(config)?;
    let runner = MigrationRunner::new(EmbeddedMigrationEngine);

    match runner.rollback_last(&database_url)? {
        Some(id) => info!("Reverted migration {}", id),
        None => warn!("No applied migrations to revert"),
    }
    Ok(())
}

/// Prints applied and pending migration IDs.
pub fn verify(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url(config)?;
    let runner = MigrationRunner::new(EmbeddedMigrationEngine);
    let status = runner.status(&database_url)?;

    for id in &status.applied {
        println!("applied  {}", id);
    }
    for id in &status.pending {
        println!("pending  {}", id);
    }
    info!(
        "{} applied, {} pending migrations",
        status.applied.len(),
        status.pending.len()
    );
    Ok(())
}
