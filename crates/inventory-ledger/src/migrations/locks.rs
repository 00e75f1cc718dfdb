/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Session-level advisory locking for migration runs.
//!
//! A Postgres advisory lock belongs to the session that took it, so the lock, every migration
//! statement and the unlock must run on the same connection. [`with_advisory_lock`] takes that
//! connection by `&mut` and hands the same one to the critical section.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool};
use diesel::PgConnection;
use tracing::{debug, info, warn};

use crate::error::LedgerError;

/// Connections that may provide cross-process mutual exclusion.
///
/// The default implementation provides none; it is meant for embedded and test backends that
/// only ever serve a single process.
pub trait AdvisoryLock {
    fn supports_advisory_lock(&self) -> bool {
        false
    }

    /// Blocks until the lock identified by `key` is held by this session.
    fn acquire_advisory_lock(&mut self, _key: i64) -> Result<(), LedgerError> {
        Ok(())
    }

    /// Releases the lock. Returns `Ok(false)` if this session did not hold it.
    fn release_advisory_lock(&mut self, _key: i64) -> Result<bool, LedgerError> {
        Ok(true)
    }
}

#[derive(QueryableByName)]
struct UnlockResult {
    #[diesel(sql_type = Bool)]
    released: bool,
}

impl AdvisoryLock for PgConnection {
    fn supports_advisory_lock(&self) -> bool {
        true
    }

    fn acquire_advisory_lock(&mut self, key: i64) -> Result<(), LedgerError> {
        diesel::sql_query("SELECT pg_advisory_lock($1)")
            .bind::<BigInt, _>(key)
            .execute(self)
            .map_err(|e| {
                LedgerError::Unavailable(format!("failed to acquire advisory lock {}: {}", key, e))
            })?;
        Ok(())
    }

    fn release_advisory_lock(&mut self, key: i64) -> Result<bool, LedgerError> {
        let result: UnlockResult = diesel::sql_query("SELECT pg_advisory_unlock($1) AS released")
            .bind::<BigInt, _>(key)
            .get_result(self)
            .map_err(|e| {
                LedgerError::Unavailable(format!("failed to release advisory lock {}: {}", key, e))
            })?;
        Ok(result.released)
    }
}

/// Runs `f` while holding advisory lock `key` on `conn`.
///
/// Lock acquisition failure aborts before `f` runs. Unlock is best effort: a failed or refused
/// unlock is logged and the lock is released when the session closes. The result of `f` is
/// returned unchanged.
pub fn with_advisory_lock<C, T, F>(conn: &mut C, key: i64, f: F) -> Result<T, LedgerError>
where
    C: AdvisoryLock,
    F: FnOnce(&mut C) -> Result<T, LedgerError>,
{
    if !conn.supports_advisory_lock() {
        debug!("Connection does not support advisory locks; running without a lock");
        return f(conn);
    }

    conn.acquire_advisory_lock(key)?;
    info!(key, "Acquired migration advisory lock");

    let result = f(conn);

    match conn.release_advisory_lock(key) {
        Ok(true) => info!(key, "Released migration advisory lock"),
        Ok(false) => warn!(key, "Advisory lock was not held at release time"),
        Err(e) => warn!(key, error = %e, "Failed to release advisory lock; it is released when the session closes"),
    }

    result
}
