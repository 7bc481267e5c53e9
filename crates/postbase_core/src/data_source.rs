//! Store handle shared by every repository.
//!
//! # Responsibility
//! - Own the single SQLite connection described by a `StoreConfig`.
//! - Reconcile the schema at startup when auto-sync is enabled.
//!
//! # Invariants
//! - `initialize` succeeds at most once per live connection.
//! - Repositories borrow the handle; nothing here is process-global.
//! - A store written by a newer binary is never opened.

use crate::config::{ConfigResult, StoreConfig};
use crate::db::migrations::latest_version;
use crate::db::schema::ensure_entity_schema;
use crate::db::{bootstrap_connection, DbError, DbResult};
use log::{error, info, warn};
use once_cell::unsync::OnceCell;
use rusqlite::Connection;
use std::time::Instant;

struct OpenStore {
    conn: Connection,
    schema_version: u32,
}

/// Connection configuration plus its lazily established connection.
pub struct DataSource {
    config: StoreConfig,
    store: OnceCell<OpenStore>,
}

impl DataSource {
    /// Creates an uninitialized data source.
    ///
    /// # Errors
    /// - Returns an error when the managed entity set is inconsistent.
    pub fn new(config: StoreConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.store.get().is_some()
    }

    /// Opens the store and reconciles its schema.
    ///
    /// # Errors
    /// - `AlreadyInitialized` when called twice without `destroy`.
    /// - `Sqlite` when the store cannot be opened or configured.
    /// - `UnsupportedSchemaVersion` when the store is newer than this binary.
    /// - `MissingEntity*` when a current-version schema lacks entity tables.
    pub fn initialize(&self) -> DbResult<()> {
        if self.is_initialized() {
            return Err(DbError::AlreadyInitialized);
        }

        let started_at = Instant::now();
        let mode = if self.config.is_in_memory() {
            "memory"
        } else {
            "file"
        };
        info!(
            "event=data_source_init module=data_source status=start mode={} schema_auto_sync={} query_logging={}",
            mode, self.config.schema_auto_sync, self.config.query_logging
        );

        match self.open_store() {
            Ok(store) => {
                let schema_version = store.schema_version;
                if schema_version != latest_version() {
                    warn!(
                        "event=schema_sync module=data_source status=skipped schema_version={} latest_version={}",
                        schema_version,
                        latest_version()
                    );
                }
                if self.store.set(store).is_err() {
                    return Err(DbError::AlreadyInitialized);
                }
                info!(
                    "event=data_source_init module=data_source status=ok mode={} schema_version={} duration_ms={}",
                    mode,
                    schema_version,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=data_source_init module=data_source status=error mode={} duration_ms={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Drops the connection. The data source can be initialized again.
    pub fn destroy(&mut self) {
        if self.store.take().is_some() {
            info!("event=data_source_destroy module=data_source status=ok");
        }
    }

    /// Returns the live connection, or `None` before `initialize`.
    pub fn connection(&self) -> Option<&Connection> {
        self.store.get().map(|store| &store.conn)
    }

    /// Schema version observed at initialization.
    pub fn schema_version(&self) -> Option<u32> {
        self.store.get().map(|store| store.schema_version)
    }

    fn open_store(&self) -> DbResult<OpenStore> {
        let mut conn = if self.config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.config.storage_location)?
        };
        let schema_version = bootstrap_connection(
            &mut conn,
            self.config.query_logging,
            self.config.schema_auto_sync,
        )?;
        if schema_version == latest_version() {
            for entity in &self.config.managed_entities {
                ensure_entity_schema(&conn, *entity)?;
            }
        }

        Ok(OpenStore {
            conn,
            schema_version,
        })
    }
}
