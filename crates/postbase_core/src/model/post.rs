//! Post entity.
//!
//! # Invariants
//! - `user_id` always references an existing user at write time.
//! - The owner may be reassigned but never cleared.

use super::user::{User, UserId};
use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-generated post identifier.
pub type PostId = i64;

/// Persisted post record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    /// Owning user, `None` when the relation was not requested.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<Box<User>>,
}

/// Input for creating a post owned by an existing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>, user_id: UserId) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id,
        }
    }

    /// Checks required fields before insert. Content may be empty text.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}

/// Partial update for a post. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<UserId>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.user_id.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            require_text("title", title)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NewPost, PostPatch};
    use crate::model::ValidationError;

    #[test]
    fn new_post_requires_title_but_allows_empty_content() {
        assert!(NewPost::new("Hello", "", 1).validate().is_ok());
        assert_eq!(
            NewPost::new("   ", "body", 1).validate(),
            Err(ValidationError::BlankField("title"))
        );
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(PostPatch::default().is_empty());
        let reassign = PostPatch {
            user_id: Some(7),
            ..PostPatch::default()
        };
        assert!(!reassign.is_empty());
        assert!(reassign.validate().is_ok());
    }
}
