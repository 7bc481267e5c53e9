//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Keep SQL details inside the persistence boundary.
//! - Translate SQLite constraint failures into semantic errors.
//!
//! # Invariants
//! - Every operation resolves a ready connection first; nothing touches SQL
//!   before the data source is initialized and its schema is current.
//! - Write paths validate input models before SQL mutations.
//! - Store failures are passed through unchanged in meaning; no retries.

use crate::data_source::DataSource;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::{EntityKind, ValidationError};
use rusqlite::{ffi, Connection};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod post_repo;
pub mod user_repo;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Operation attempted before `DataSource::initialize`.
    Uninitialized,
    /// The data source configuration does not manage this entity.
    EntityNotManaged(EntityKind),
    /// Schema sync was skipped and the store is not at the current version.
    SchemaNotReady {
        expected_version: u32,
        actual_version: u32,
    },
    /// A unique constraint rejected the write.
    UniquenessViolation(String),
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation(String),
    Validation(ValidationError),
    Db(DbError),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "data source is not initialized"),
            Self::EntityNotManaged(entity) => {
                write!(f, "entity `{entity}` is not managed by this data source")
            }
            Self::SchemaNotReady {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::UniquenessViolation(detail) => write!(f, "uniqueness violation: {detail}"),
            Self::ForeignKeyViolation(detail) => write!(f, "foreign key violation: {detail}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Uninitialized
            | Self::EntityNotManaged(_)
            | Self::SchemaNotReady { .. }
            | Self::UniquenessViolation(_)
            | Self::ForeignKeyViolation(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            let detail = || message.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::UniquenessViolation(detail());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::ForeignKeyViolation(detail());
                }
                _ => {}
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Page window requested by a caller. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Clamps the window: page `0` becomes `1`, limit `0` becomes the default
    /// and limits above the maximum are capped.
    pub fn normalized(self) -> Self {
        let page = self.page.max(DEFAULT_PAGE);
        let limit = match self.limit {
            0 => DEFAULT_PAGE_SIZE,
            value => value.min(MAX_PAGE_SIZE),
        };
        Self { page, limit }
    }

    /// Rows skipped before this page, after normalization.
    pub fn offset(self) -> i64 {
        let normalized = self.normalized();
        (i64::from(normalized.page) - 1) * i64::from(normalized.limit)
    }
}

/// One page of results plus the unwindowed row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Number of pages needed to cover `total` rows.
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

/// Resolves the connection for an operation on `entity`.
pub(crate) fn ready_connection(
    source: &DataSource,
    entity: EntityKind,
) -> RepoResult<&Connection> {
    let conn = source.connection().ok_or(RepoError::Uninitialized)?;
    if !source.config().manages(entity) {
        return Err(RepoError::EntityNotManaged(entity));
    }

    let expected_version = latest_version();
    let actual_version = source.schema_version().unwrap_or(0);
    if actual_version != expected_version {
        return Err(RepoError::SchemaNotReady {
            expected_version,
            actual_version,
        });
    }

    Ok(conn)
}

pub(crate) fn count_to_u64(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative count `{value}` for {column}")))
}
