/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Test fixture for the Postgres-backed ledger.
//!
//! The schema is migrated once per process through [`MigrationRunner`]. Each fixture owns a
//! single-connection pool whose connection sits inside a test transaction that is never
//! committed, so every row a test writes disappears with the fixture. `DATABASE_URL` must point at
//! a reachable Postgres; the fixture panics without it.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use dotenv::dotenv;
use inventory_ledger::dal::{Transaction, DAL};
use inventory_ledger::migrations::{EmbeddedMigrationEngine, MigrationRunner};
use inventory_models::models::reporter_resources::{NewReporterResource, ReporterResource};
use inventory_models::models::representation_references::ReferenceKey;
use inventory_models::models::resources::{NewResource, Resource};
use once_cell::sync::Lazy;
use std::env;
use uuid::Uuid;

static DATABASE_URL: Lazy<String> = Lazy::new(|| {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    MigrationRunner::new(EmbeddedMigrationEngine)
        .run(&database_url)
        .expect("Failed to run migrations");
    database_url
});

/// The migrated test database.
pub fn database_url() -> String {
    DATABASE_URL.clone()
}

#[derive(Debug)]
struct TestTransaction;

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.begin_test_transaction()
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Represents a test fixture for the inventory ledger.
#[derive(Clone)]
pub struct TestFixture {
    /// The Data Access Layer (DAL) instance for database operations.
    pub dal: DAL,
}

impl TestFixture {
    /// Creates a fixture on a fresh test transaction.
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is unset, or the database is unreachable or cannot be migrated.
    pub fn new() -> Self {
        let database_url = database_url();

        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(TestTransaction))
            .build(manager)
            .expect("Failed to create test pool");

        TestFixture {
            dal: DAL::new(pool),
        }
    }

    /// A reporter key no other test uses, so concurrent test transactions never wait on each other.
    pub fn unique_key(&self, reporter_type: &str) -> ReferenceKey {
        ReferenceKey::new(
            format!("host-{}", Uuid::new_v4()),
            reporter_type,
            "host",
            format!("instance-{}", reporter_type),
        )
    }

    /// Inserts a test `host` resource.
    pub fn insert_test_resource(&self) -> Resource {
        let new_resource =
            NewResource::new("host".to_string(), 0).expect("Failed to create NewResource");
        self.dal
            .resources()
            .create(Transaction::Own, &new_resource)
            .expect("Failed to create resource")
    }

    /// Inserts a reporter resource under `resource_id`.
    pub fn insert_test_reporter_resource(
        &self,
        resource_id: Uuid,
        key: ReferenceKey,
    ) -> ReporterResource {
        let new_reporter_resource = NewReporterResource::new(
            key,
            resource_id,
            "https://inventory.example.com/api/hosts/1".to_string(),
            None,
        )
        .expect("Failed to create NewReporterResource");
        self.dal
            .reporter_resources()
            .create(Transaction::Own, &new_reporter_resource)
            .expect("Failed to create reporter resource")
    }
}
