/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Schema migrations
//!
//! Migrations are identified by `yyyyMMddHHmmss` timestamps and applied strictly in ID order.
//! A malformed list (empty ID, non-timestamp, not strictly increasing) is a programming error and
//! makes [`MigrationRunner::new`] panic.
//!
//! Migrations are applied one at a time and never wrapped in a single transaction, because some
//! of them (concurrent index builds) cannot run inside one. Cross-instance exclusion instead comes
//! from a session-level advisory lock held on one dedicated, unpooled connection for the whole
//! run. The engine is injected into the runner so tests can substitute their own.
//!
//! ```rust,ignore
//! let runner = MigrationRunner::new(EmbeddedMigrationEngine);
//! runner.run(&database_url)?;
//! ```

use std::marker::PhantomData;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use tracing::info;

use crate::error::LedgerError;

mod engine;
mod locks;

pub use engine::{migration_id, EmbeddedMigrationEngine, MigrationEngine, MigrationStatus};
pub use locks::{with_advisory_lock, AdvisoryLock};

/// SQL migrations of the ledger schema.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../inventory-models/migrations");

/// Key of the Postgres advisory lock that serialises migration runs.
pub const MIGRATION_ADVISORY_LOCK_KEY: i64 = 1234567890;

const MIGRATION_ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Checks that every ID is a `yyyyMMddHHmmss` timestamp and that IDs strictly increase.
pub fn validate_migration_ids(ids: &[String]) -> Result<(), String> {
    let mut previous: Option<(NaiveDateTime, &str)> = None;

    for (position, id) in ids.iter().enumerate() {
        if id.trim().is_empty() {
            return Err(format!("migration at position {} has an empty ID", position));
        }
        if id.len() != 14 || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("migration ID {} is not a yyyyMMddHHmmss timestamp", id));
        }
        let timestamp = NaiveDateTime::parse_from_str(id, MIGRATION_ID_FORMAT)
            .map_err(|e| format!("migration ID {} is not a valid timestamp: {}", id, e))?;

        if let Some((previous_timestamp, previous_id)) = previous {
            if timestamp <= previous_timestamp {
                return Err(format!(
                    "migration ID {} must be later than preceding ID {}",
                    id, previous_id
                ));
            }
        }
        previous = Some((timestamp, id.as_str()));
    }

    Ok(())
}

/// Runs an injected [`MigrationEngine`] under the migration advisory lock.
pub struct MigrationRunner<E, C = PgConnection> {
    engine: E,
    ids: Vec<String>,
    _connection: PhantomData<fn(&mut C)>,
}

impl<E, C> MigrationRunner<E, C>
where
    E: MigrationEngine<C>,
    C: AdvisoryLock,
{
    /// Creates a runner around `engine`.
    ///
    /// # Panics
    ///
    /// Panics if the engine's migration list is malformed.
    pub fn new(engine: E) -> Self {
        let ids = engine.migration_ids();
        if let Err(e) = validate_migration_ids(&ids) {
            panic!("invalid migration list: {}", e);
        }
        MigrationRunner {
            engine,
            ids,
            _connection: PhantomData,
        }
    }

    /// Known migration IDs in application order.
    pub fn migration_ids(&self) -> &[String] {
        &self.ids
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Applies every pending migration on `conn` while holding the advisory lock.
    pub fn migrate_on(&self, conn: &mut C) -> Result<Vec<String>, LedgerError> {
        with_advisory_lock(conn, MIGRATION_ADVISORY_LOCK_KEY, |conn| self.engine.migrate(conn))
    }

    /// Applies pending migrations up to and including `target` on `conn`.
    ///
    /// # Returns
    ///
    /// `InvalidArgument` for an empty or unknown target, before any lock is taken.
    pub fn migrate_to_on(&self, conn: &mut C, target: &str) -> Result<Vec<String>, LedgerError> {
        let target = self.resolve_target(target)?;
        with_advisory_lock(conn, MIGRATION_ADVISORY_LOCK_KEY, |conn| {
            self.engine.migrate_to(conn, &target)
        })
    }

    /// Reverts the most recent migration on `conn`. Never called implicitly.
    pub fn rollback_last_on(&self, conn: &mut C) -> Result<Option<String>, LedgerError> {
        with_advisory_lock(conn, MIGRATION_ADVISORY_LOCK_KEY, |conn| {
            self.engine.rollback_last(conn)
        })
    }

    pub fn status_on(&self, conn: &mut C) -> Result<MigrationStatus, LedgerError> {
        self.engine.status(conn)
    }

    fn resolve_target(&self, target: &str) -> Result<String, LedgerError> {
        let target = target.trim().replace('-', "");
        if target.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "migration target cannot be empty".to_string(),
            ));
        }
        if !self.ids.contains(&target) {
            return Err(LedgerError::InvalidArgument(format!(
                "unknown migration target {}",
                target
            )));
        }
        Ok(target)
    }
}

impl<E> MigrationRunner<E, PgConnection>
where
    E: MigrationEngine<PgConnection>,
{
    /// Applies every pending migration on a dedicated session to `database_url`.
    pub fn run(&self, database_url: &str) -> Result<Vec<String>, LedgerError> {
        with_session(database_url, |conn| self.migrate_on(conn))
    }

    /// Applies pending migrations up to and including `target` on a dedicated session.
    pub fn run_to(&self, database_url: &str, target: &str) -> Result<Vec<String>, LedgerError> {
        let target = self.resolve_target(target)?;
        with_session(database_url, |conn| self.migrate_to_on(conn, &target))
    }

    /// Reverts the most recent migration on a dedicated session.
    pub fn rollback_last(&self, database_url: &str) -> Result<Option<String>, LedgerError> {
        with_session(database_url, |conn| self.rollback_last_on(conn))
    }

    pub fn status(&self, database_url: &str) -> Result<MigrationStatus, LedgerError> {
        with_session(database_url, |conn| self.status_on(conn))
    }
}

/// Opens a session outside any pool, runs `f` on it and closes it. Closing the session also
/// releases any advisory lock an unlock failed to release.
fn with_session<T, F>(database_url: &str, f: F) -> Result<T, LedgerError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, LedgerError>,
{
    let mut conn = PgConnection::establish(database_url)?;
    info!("Opened dedicated migration session");
    let result = f(&mut conn);
    drop(conn);
    result
}
