//! SQLite storage bootstrap, schema helpers and row decoding.
//!
//! # Responsibility
//! - Open and configure SQLite connections for one named database file.
//! - Reconcile the caller-declared database version with `PRAGMA user_version`.
//! - Generate identifier-safe DDL/DML text for record-backed tables.
//!
//! # Invariants
//! - The database version is recorded, never migrated: no upgrade SQL runs.
//! - Every identifier interpolated into SQL passes `validate_identifier`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod rows;
pub mod schema;

pub use open::{open_database, open_database_in_memory};
pub use rows::collect_values;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// On-disk version is newer than the version the caller asked for.
    UnsupportedSchemaVersion {
        db_version: u32,
        requested_version: u32,
    },
    /// Table or column name is not a plain SQL identifier.
    InvalidIdentifier(String),
    /// A record type declared no columns for `table`.
    EmptySchema(String),
    Io(std::io::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                requested_version,
            } => write!(
                f,
                "database version {db_version} is newer than requested version {requested_version}"
            ),
            Self::InvalidIdentifier(value) => write!(f, "invalid SQL identifier `{value}`"),
            Self::EmptySchema(table) => write!(f, "no columns declared for table `{table}`"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::InvalidIdentifier(_) => None,
            Self::EmptySchema(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
