//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Apply schema migrations in deterministic order.
//! - Inspect whether a connection exposes the tables entities need.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Connections returned by this module have `foreign_keys=ON`.
//! - `DbError` covers every failure to reach or reconcile the store.

use crate::model::EntityKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub mod schema;

pub(crate) use open::bootstrap_connection;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure to reach the store or to reconcile its schema.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Schema sync finished but an entity table is still absent.
    MissingEntityTable(EntityKind),
    /// Schema sync finished but an entity column is still absent.
    MissingEntityColumn {
        entity: EntityKind,
        column: &'static str,
    },
    /// `initialize` was called on an already initialized data source.
    AlreadyInitialized,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MissingEntityTable(entity) => {
                write!(f, "schema is missing table `{}`", entity.table_name())
            }
            Self::MissingEntityColumn { entity, column } => write!(
                f,
                "schema is missing column `{column}` in table `{}`",
                entity.table_name()
            ),
            Self::AlreadyInitialized => write!(f, "data source is already initialized"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::MissingEntityTable(_) => None,
            Self::MissingEntityColumn { .. } => None,
            Self::AlreadyInitialized => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
