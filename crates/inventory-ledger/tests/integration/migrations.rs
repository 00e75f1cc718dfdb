/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use diesel::PgConnection;
use inventory_ledger::migrations::{
    EmbeddedMigrationEngine, MigrationEngine, MigrationRunner, MigrationStatus,
};
use inventory_ledger::{ErrorKind, LedgerError};
use serial_test::serial;

use crate::fixtures;

#[test]
#[serial]
fn test_migrations_are_idempotent() {
    let database_url = fixtures::database_url();
    let runner = MigrationRunner::new(EmbeddedMigrationEngine);

    assert!(runner.run(&database_url).unwrap().is_empty());
    assert!(runner.run(&database_url).unwrap().is_empty());
    assert!(runner.run_to(&database_url, "2025-12-15-090000").unwrap().is_empty());

    let status = runner.status(&database_url).unwrap();
    assert!(status.pending.is_empty());
    assert_eq!(status.applied, runner.migration_ids().to_vec());
}

#[test]
fn test_unknown_target_fails_before_connecting() {
    let runner = MigrationRunner::new(EmbeddedMigrationEngine);
    let err = runner
        .run_to("postgres://nobody@127.0.0.1:1/none", "20990101000000")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

/// Engine that records how many runs overlap.
#[derive(Default)]
struct SlowEngine {
    active: AtomicUsize,
    max_active: AtomicUsize,
    runs: AtomicUsize,
}

impl MigrationEngine<PgConnection> for SlowEngine {
    fn migration_ids(&self) -> Vec<String> {
        vec!["20250101000000".to_string()]
    }

    fn migrate(&self, _conn: &mut PgConnection) -> Result<Vec<String>, LedgerError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    fn migrate_to(&self, conn: &mut PgConnection, _target: &str) -> Result<Vec<String>, LedgerError> {
        self.migrate(conn)
    }

    fn rollback_last(&self, _conn: &mut PgConnection) -> Result<Option<String>, LedgerError> {
        Ok(None)
    }

    fn status(&self, _conn: &mut PgConnection) -> Result<MigrationStatus, LedgerError> {
        Ok(MigrationStatus::default())
    }
}

#[test]
#[serial]
fn test_concurrent_runs_are_serialised() {
    let database_url = fixtures::database_url();
    let runner = MigrationRunner::new(SlowEngine::default());

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| runner.run(&database_url).expect("Failed to run migrations"));
        }
    });

    let engine = runner.engine();
    assert_eq!(engine.runs.load(Ordering::SeqCst), 4);
    assert_eq!(engine.max_active.load(Ordering::SeqCst), 1);
}
