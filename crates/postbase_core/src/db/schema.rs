//! Schema introspection helpers.

use super::{DbError, DbResult};
use crate::model::EntityKind;
use rusqlite::Connection;

/// Returns whether a table with the given name exists.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns whether `table` exposes `column`.
pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Verifies the table and columns backing one entity.
pub fn ensure_entity_schema(conn: &Connection, entity: EntityKind) -> DbResult<()> {
    if !table_exists(conn, entity.table_name())? {
        return Err(DbError::MissingEntityTable(entity));
    }
    for &column in entity.required_columns() {
        if !table_has_column(conn, entity.table_name(), column)? {
            return Err(DbError::MissingEntityColumn { entity, column });
        }
    }
    Ok(())
}
