/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use diesel::prelude::*;
use diesel::sql_query;
use inventory_ledger::db::create_shared_connection_pool;
use inventory_ledger::ErrorKind;

use crate::fixtures;

#[test]
fn test_connection_pool_integration() {
    let database_url = fixtures::database_url();

    let pool = create_shared_connection_pool(&database_url, "", 2).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    sql_query("SELECT 1").execute(&mut conn).expect("Failed to query");
}

#[test]
fn test_malformed_url_is_invalid_argument() {
    let err = create_shared_connection_pool("not a url", "inventory", 1)
        .err()
        .expect("malformed URL accepted");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
