//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by relation integrity.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - `open_db*` helpers return connections with migrations fully applied.
//! - Every store connection goes through `bootstrap_connection`.

use super::migrations::{apply_migrations, current_version, ensure_supported_version};
use super::DbResult;
use crate::logging::log_sql;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");
    let conn = Connection::open(path).map_err(|err| {
        log_open_failure("file", started_at, "db_open_failed", &err);
        err
    })?;
    finish_open(conn, "file", started_at)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");
    let conn = Connection::open_in_memory().map_err(|err| {
        log_open_failure("memory", started_at, "db_open_failed", &err);
        err
    })?;
    finish_open(conn, "memory", started_at)
}

/// Applies pragmas every store connection needs.
///
/// Installs the SQL trace sink when `query_logging` is set.
pub fn configure_connection(conn: &mut Connection, query_logging: bool) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if query_logging {
        conn.trace(Some(log_sql));
    }
    Ok(())
}

/// Configures a freshly opened connection and reconciles its schema version.
///
/// Migrations run only when `schema_auto_sync` is set. Returns the schema
/// version the store is left at.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store is newer than this binary.
/// - `Sqlite` when pragmas or migrations fail.
pub(crate) fn bootstrap_connection(
    conn: &mut Connection,
    query_logging: bool,
    schema_auto_sync: bool,
) -> DbResult<u32> {
    configure_connection(conn, query_logging)?;
    ensure_supported_version(conn)?;
    if schema_auto_sync {
        apply_migrations(conn)?;
    }
    current_version(conn)
}

fn finish_open(mut conn: Connection, mode: &str, started_at: Instant) -> DbResult<Connection> {
    match bootstrap_connection(&mut conn, false, true) {
        Ok(_) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            log_open_failure(mode, started_at, "db_bootstrap_failed", &err);
            Err(err)
        }
    }
}

fn log_open_failure(
    mode: &str,
    started_at: Instant,
    error_code: &str,
    err: &dyn std::fmt::Display,
) {
    error!(
        "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
        mode,
        started_at.elapsed().as_millis(),
        error_code,
        err
    );
}
