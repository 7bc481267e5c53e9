//! Entity model for the user/post store.
//!
//! # Responsibility
//! - Define the persisted record shapes and their write models.
//! - Validate write models before any SQL mutation.
//!
//! # Invariants
//! - Surrogate ids are generated by the store, never by callers.
//! - Relation fields are `None` until explicitly loaded.
//! - Every post has exactly one owning user.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod post;
pub mod user;

/// Entity types the data source can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Post,
}

impl EntityKind {
    /// Every entity known to this binary, parents first.
    pub const ALL: [EntityKind; 2] = [EntityKind::User, EntityKind::Post];

    /// Backing table name.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
        }
    }

    /// Columns a ready schema must expose for this entity.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::User => &["id", "name", "email"],
            Self::Post => &["id", "title", "content", "user_id"],
        }
    }

    /// Entity targeted by this entity's owning relation, if any.
    pub fn relation_target(self) -> Option<EntityKind> {
        match self {
            Self::User => None,
            Self::Post => Some(Self::User),
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Write-model validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace only.
    BlankField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require_text, EntityKind, ValidationError};

    #[test]
    fn post_relation_targets_user() {
        assert_eq!(EntityKind::Post.relation_target(), Some(EntityKind::User));
        assert_eq!(EntityKind::User.relation_target(), None);
    }

    #[test]
    fn require_text_rejects_whitespace() {
        assert_eq!(
            require_text("name", "  \t"),
            Err(ValidationError::BlankField("name"))
        );
        assert!(require_text("name", "Thomas").is_ok());
    }
}
