//! Environment-driven store and logging configuration.
//!
//! # Responsibility
//! - Describe how to reach the store and which entities it governs.
//! - Parse environment flags into typed settings.
//!
//! # Invariants
//! - `managed_entities` is an ordered set without duplicates.
//! - Schema auto-sync is on when `DB_SYNCHRONIZE` is true or the profile is not production.
//! - Parsing never reads process environment except through `from_env`.

use crate::logging::default_log_level;
use crate::model::EntityKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "DB_PATH";
pub const ENV_DB_SYNCHRONIZE: &str = "DB_SYNCHRONIZE";
pub const ENV_DB_LOGGING: &str = "DB_LOGGING";
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LOG_DIR";

const DEFAULT_DB_PATH: &str = "database.sqlite";
const PRODUCTION_PROFILE: &str = "production";
const IN_MEMORY_LOCATION: &str = ":memory:";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration parsing or validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A boolean flag carried text that is not a recognized boolean.
    InvalidBool { key: &'static str, value: String },
    /// An entity is managed while the target of its owner relation is not.
    MissingRelationTarget {
        entity: EntityKind,
        target: EntityKind,
    },
    /// No entity is managed at all.
    NoManagedEntities,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBool { key, value } => write!(
                f,
                "invalid boolean `{value}` for {key}; expected true|false|1|0|yes|no"
            ),
            Self::MissingRelationTarget { entity, target } => write!(
                f,
                "entity `{entity}` is managed but its relation target `{target}` is not"
            ),
            Self::NoManagedEntities => write!(f, "at least one entity must be managed"),
        }
    }
}

impl Error for ConfigError {}

/// Static description of the store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the SQLite file, or `:memory:`.
    pub storage_location: PathBuf,
    /// Reconcile the schema with entity definitions at startup.
    pub schema_auto_sync: bool,
    /// Entities governed by the data source, in registration order.
    pub managed_entities: Vec<EntityKind>,
    /// Emit every executed SQL statement at debug level.
    pub query_logging: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_location: PathBuf::from(DEFAULT_DB_PATH),
            schema_auto_sync: true,
            managed_entities: EntityKind::ALL.to_vec(),
            query_logging: true,
        }
    }
}

impl StoreConfig {
    /// File-backed configuration with defaults for everything else.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            storage_location: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Private in-memory store, used by tests and throwaway runs.
    pub fn in_memory() -> Self {
        Self {
            storage_location: PathBuf::from(IN_MEMORY_LOCATION),
            query_logging: false,
            ..Self::default()
        }
    }

    /// Replaces the managed entity set, keeping first occurrences only.
    pub fn with_entities(mut self, entities: &[EntityKind]) -> Self {
        self.managed_entities = dedup_entities(entities);
        self
    }

    pub fn with_schema_auto_sync(mut self, enabled: bool) -> Self {
        self.schema_auto_sync = enabled;
        self
    }

    /// Returns whether the store lives in memory only.
    pub fn is_in_memory(&self) -> bool {
        self.storage_location.as_os_str() == IN_MEMORY_LOCATION
    }

    /// Returns whether the given entity is governed by this configuration.
    pub fn manages(&self, entity: EntityKind) -> bool {
        self.managed_entities.contains(&entity)
    }

    /// Loads `.env` when present, then reads process environment.
    ///
    /// # Errors
    /// - Returns an error when a boolean flag is malformed.
    /// - Returns an error when the entity set is inconsistent.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// - Returns an error when a boolean flag is malformed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_location = lookup(ENV_DB_PATH)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);

        let production = lookup(ENV_APP_ENV)
            .map(|value| value.trim().eq_ignore_ascii_case(PRODUCTION_PROFILE))
            .unwrap_or(false);
        let schema_auto_sync = parse_flag(ENV_DB_SYNCHRONIZE, lookup(ENV_DB_SYNCHRONIZE))?
            .unwrap_or(false)
            || !production;
        let query_logging = parse_flag(ENV_DB_LOGGING, lookup(ENV_DB_LOGGING))?.unwrap_or(true);

        let config = Self {
            storage_location,
            schema_auto_sync,
            managed_entities: EntityKind::ALL.to_vec(),
            query_logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks entity-set consistency.
    ///
    /// # Errors
    /// - Returns an error when no entity is managed.
    /// - Returns an error when a relation target is not managed.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.managed_entities.is_empty() {
            return Err(ConfigError::NoManagedEntities);
        }
        for entity in &self.managed_entities {
            if let Some(target) = entity.relation_target() {
                if !self.manages(target) {
                    return Err(ConfigError::MissingRelationTarget {
                        entity: *entity,
                        target,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Logging settings for the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Rolling file logs go here when set; stderr otherwise.
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup(ENV_LOG_LEVEL)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = lookup(ENV_LOG_DIR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self { level, log_dir }
    }
}

fn parse_flag(key: &'static str, value: Option<String>) -> ConfigResult<Option<bool>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}

fn dedup_entities(entities: &[EntityKind]) -> Vec<EntityKind> {
    let mut unique = Vec::with_capacity(entities.len());
    for entity in entities {
        if !unique.contains(entity) {
            unique.push(*entity);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LogConfig, StoreConfig};
    use crate::model::EntityKind;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_sync_outside_production() {
        let config = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.storage_location, PathBuf::from("database.sqlite"));
        assert!(config.schema_auto_sync);
        assert!(config.query_logging);
        assert_eq!(config.managed_entities, EntityKind::ALL.to_vec());
    }

    #[test]
    fn production_profile_disables_sync_by_default() {
        let config =
            StoreConfig::from_lookup(lookup_from(&[("APP_ENV", "Production")])).unwrap();
        assert!(!config.schema_auto_sync);
    }

    #[test]
    fn sync_flag_enables_sync_in_production() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("DB_SYNCHRONIZE", "true"),
        ]))
        .unwrap();
        assert!(config.schema_auto_sync);

        let config = StoreConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("DB_SYNCHRONIZE", "no"),
        ]))
        .unwrap();
        assert!(!config.schema_auto_sync);
    }

    #[test]
    fn false_sync_flag_does_not_disable_sync_outside_production() {
        let config =
            StoreConfig::from_lookup(lookup_from(&[("DB_SYNCHRONIZE", "false")])).unwrap();
        assert!(config.schema_auto_sync);

        let config = StoreConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "development"),
            ("DB_SYNCHRONIZE", "0"),
            ("DB_LOGGING", "no"),
            ("DB_PATH", " data/app.sqlite "),
        ]))
        .unwrap();
        assert!(config.schema_auto_sync);
        assert!(!config.query_logging);
        assert_eq!(config.storage_location, PathBuf::from("data/app.sqlite"));
    }

    #[test]
    fn malformed_flag_is_rejected() {
        let err = StoreConfig::from_lookup(lookup_from(&[("DB_SYNCHRONIZE", "maybe")]))
            .expect_err("malformed flag must fail");
        assert_eq!(
            err,
            ConfigError::InvalidBool {
                key: "DB_SYNCHRONIZE",
                value: "maybe".to_string(),
            }
        );
    }

    #[test]
    fn entity_set_is_deduplicated_in_order() {
        let config = StoreConfig::in_memory().with_entities(&[
            EntityKind::User,
            EntityKind::Post,
            EntityKind::User,
        ]);
        assert_eq!(
            config.managed_entities,
            vec![EntityKind::User, EntityKind::Post]
        );
        assert!(config.is_in_memory());
    }

    #[test]
    fn post_without_user_is_rejected() {
        let config = StoreConfig::in_memory().with_entities(&[EntityKind::Post]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingRelationTarget {
                entity: EntityKind::Post,
                target: EntityKind::User,
            })
        );
        let empty = StoreConfig::in_memory().with_entities(&[]);
        assert_eq!(empty.validate(), Err(ConfigError::NoManagedEntities));
    }

    #[test]
    fn log_config_reads_level_and_dir() {
        let config = LogConfig::from_lookup(lookup_from(&[
            ("LOG_LEVEL", "warn"),
            ("LOG_DIR", "/var/log/postbase"),
        ]));
        assert_eq!(config.level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/postbase")));

        let fallback = LogConfig::from_lookup(lookup_from(&[]));
        assert!(fallback.log_dir.is_none());
        assert!(!fallback.level.is_empty());
    }
}
