/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Error taxonomy shared by every ledger operation.
//!
//! Driver errors are classified once, here, so callers can branch on [`ErrorKind`] instead of
//! inspecting messages. Nothing in this crate retries on error.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Errors returned by the ledger, index, writer and migration operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Missing or malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A composite key or transaction id is already taken, or a version does not advance.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The targeted resource or reporter resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The database could not be reached or the migration lock could not be taken.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Any other driver, transaction or migration failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`LedgerError`], for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Conflict,
    NotFound,
    Unavailable,
    Internal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Unavailable(_) => ErrorKind::Unavailable,
            LedgerError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Classifies a diesel error and prefixes the message with the table/key it concerns.
    pub fn from_diesel(context: &str, err: DieselError) -> Self {
        let message = match &err {
            DieselError::DatabaseError(_, info) => format!("{}: {}", context, info.message()),
            other => format!("{}: {}", context, other),
        };

        match err {
            DieselError::NotFound => LedgerError::NotFound(message),
            DieselError::DatabaseError(kind, _) => match kind {
                DatabaseErrorKind::UniqueViolation => LedgerError::Conflict(message),
                DatabaseErrorKind::ForeignKeyViolation => LedgerError::NotFound(message),
                DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation => {
                    LedgerError::InvalidArgument(message)
                }
                DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::UnableToSendCommand => {
                    LedgerError::Unavailable(message)
                }
                _ => LedgerError::Internal(message),
            },
            _ => LedgerError::Internal(message),
        }
    }
}

/// `map_err` adapter: `.map_err(db_error("resource"))`.
pub(crate) fn db_error(context: impl Into<String>) -> impl FnOnce(DieselError) -> LedgerError {
    let context = context.into();
    move |err| LedgerError::from_diesel(&context, err)
}

impl From<DieselError> for LedgerError {
    fn from(err: DieselError) -> Self {
        LedgerError::from_diesel("database", err)
    }
}

impl From<r2d2::Error> for LedgerError {
    fn from(err: r2d2::Error) -> Self {
        LedgerError::Unavailable(format!("connection pool: {}", err))
    }
}

impl From<diesel::ConnectionError> for LedgerError {
    fn from(err: diesel::ConnectionError) -> Self {
        LedgerError::Unavailable(format!("database connection: {}", err))
    }
}
