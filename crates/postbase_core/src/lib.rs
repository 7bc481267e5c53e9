//! Data-access layer for users and their posts over SQLite.
//! This crate is the single source of truth for store invariants.

pub mod config;
pub mod data_source;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, ConfigResult, LogConfig, StoreConfig};
pub use data_source::DataSource;
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::post::{NewPost, Post, PostId, PostPatch};
pub use model::user::{NewUser, User, UserId, UserPatch};
pub use model::{EntityKind, ValidationError};
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{Page, PageRequest, RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
