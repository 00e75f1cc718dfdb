/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Migration engines.
//!
//! An engine knows the ordered migration list and how to apply or revert it on one connection.
//! It never locks; the runner does that around it.

use diesel::migration::{Migration, MigrationSource, MigrationVersion};
use diesel::pg::Pg;
use diesel_migrations::MigrationHarness;
use tracing::{error, info};

use super::MIGRATIONS;
use crate::error::LedgerError;

/// Applied and pending migration IDs of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied: Vec<String>,
    pub pending: Vec<String>,
}

/// Applies an ordered, timestamp-identified migration list over connections of type `C`.
pub trait MigrationEngine<C> {
    /// IDs of every known migration, in the order they must be applied.
    fn migration_ids(&self) -> Vec<String>;

    /// Applies every pending migration, one at a time. Returns the IDs applied by this call.
    fn migrate(&self, conn: &mut C) -> Result<Vec<String>, LedgerError>;

    /// Applies pending migrations up to and including `target`.
    fn migrate_to(&self, conn: &mut C, target: &str) -> Result<Vec<String>, LedgerError>;

    /// Reverts the most recently applied migration, if any.
    fn rollback_last(&self, conn: &mut C) -> Result<Option<String>, LedgerError>;

    fn status(&self, conn: &mut C) -> Result<MigrationStatus, LedgerError>;
}

/// Normalises a diesel migration version (`2025-12-10-120000`) to a migration ID
/// (`20251210120000`).
pub fn migration_id(version: &MigrationVersion<'_>) -> String {
    version.to_string().replace('-', "")
}

/// Production engine over the SQL migrations embedded from the models crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedMigrationEngine;

impl EmbeddedMigrationEngine {
    fn known(&self) -> Result<Vec<Box<dyn Migration<Pg>>>, LedgerError> {
        let mut migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS)
            .map_err(|e| LedgerError::Internal(format!("failed to load embedded migrations: {}", e)))?;
        migrations.sort_by_key(|m| migration_id(&m.name().version()));
        Ok(migrations)
    }

    fn applied<C: MigrationHarness<Pg>>(&self, conn: &mut C) -> Result<Vec<String>, LedgerError> {
        let mut applied: Vec<String> = conn
            .applied_migrations()
            .map_err(|e| LedgerError::Internal(format!("failed to read applied migrations: {}", e)))?
            .iter()
            .map(migration_id)
            .collect();
        applied.sort();
        Ok(applied)
    }

    /// Applies known, unapplied migrations whose ID is `<= limit` (all of them for `None`).
    fn apply<C: MigrationHarness<Pg>>(
        &self,
        conn: &mut C,
        limit: Option<&str>,
    ) -> Result<Vec<String>, LedgerError> {
        let known = self.known()?;
        let applied = self.applied(conn)?;

        let known_ids: Vec<String> = known.iter().map(|m| migration_id(&m.name().version())).collect();
        if let Some(unknown) = applied.iter().find(|id| !known_ids.contains(id)) {
            return Err(LedgerError::Internal(format!(
                "database has applied migration {} which this build does not know",
                unknown
            )));
        }

        let mut ran = Vec::new();
        for (migration, id) in known.iter().zip(known_ids) {
            if applied.contains(&id) {
                continue;
            }
            if limit.is_some_and(|limit| id.as_str() > limit) {
                break;
            }

            info!(migration = %id, name = %migration.name(), "Applying migration");
            conn.run_migration(migration.as_ref()).map_err(|e| {
                error!(migration = %id, error = %e, "Migration failed");
                LedgerError::Internal(format!("migration {} failed: {}", id, e))
            })?;
            ran.push(id);
        }

        if ran.is_empty() {
            info!("No pending migrations");
        } else {
            info!(count = ran.len(), "Migrations applied");
        }
        Ok(ran)
    }
}

impl<C> MigrationEngine<C> for EmbeddedMigrationEngine
where
    C: MigrationHarness<Pg>,
{
    fn migration_ids(&self) -> Vec<String> {
        match self.known() {
            Ok(migrations) => migrations
                .iter()
                .map(|m| migration_id(&m.name().version()))
                .collect(),
            Err(e) => {
                error!(error = %e, "Embedded migrations are unreadable");
                Vec::new()
            }
        }
    }

    fn migrate(&self, conn: &mut C) -> Result<Vec<String>, LedgerError> {
        self.apply(conn, None)
    }

    fn migrate_to(&self, conn: &mut C, target: &str) -> Result<Vec<String>, LedgerError> {
        self.apply(conn, Some(target))
    }

    fn rollback_last(&self, conn: &mut C) -> Result<Option<String>, LedgerError> {
        if self.applied(conn)?.is_empty() {
            info!("No applied migrations to roll back");
            return Ok(None);
        }

        let reverted = conn
            .revert_last_migration(MIGRATIONS)
            .map_err(|e| LedgerError::Internal(format!("rollback failed: {}", e)))?;
        let id = migration_id(&reverted);
        info!(migration = %id, "Rolled back migration");
        Ok(Some(id))
    }

    fn status(&self, conn: &mut C) -> Result<MigrationStatus, LedgerError> {
        let applied = self.applied(conn)?;
        let pending = MigrationEngine::<C>::migration_ids(self)
            .into_iter()
            .filter(|id| !applied.contains(id))
            .collect();
        Ok(MigrationStatus { applied, pending })
    }
}
