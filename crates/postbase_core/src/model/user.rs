//! User entity.
//!
//! # Invariants
//! - `email` is unique across all users (enforced by the store).
//! - Deleting a user removes every post it owns.

use super::post::Post;
use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-generated user identifier.
pub type UserId = i64;

/// Persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// `None` when the relation was not requested.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub posts: Option<Vec<Post>>,
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Checks required fields before insert.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;
        Ok(())
    }
}

/// Partial update for a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    /// Checks every provided field before update.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", name)?;
        }
        if let Some(email) = self.email.as_deref() {
            require_text("email", email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NewUser, User, UserPatch};
    use crate::model::ValidationError;
    use serde_json::json;

    #[test]
    fn new_user_requires_name_and_email() {
        assert!(NewUser::new("Thomas", "thomas@example.com").validate().is_ok());
        assert_eq!(
            NewUser::new("", "thomas@example.com").validate(),
            Err(ValidationError::BlankField("name"))
        );
        assert_eq!(
            NewUser::new("Thomas", " ").validate(),
            Err(ValidationError::BlankField("email"))
        );
    }

    #[test]
    fn patch_only_validates_provided_fields() {
        let patch = UserPatch {
            name: Some("X".to_string()),
            email: None,
        };
        assert!(!patch.is_empty());
        assert!(patch.validate().is_ok());
        assert!(UserPatch::default().is_empty());
    }

    #[test]
    fn unloaded_posts_are_omitted_from_json() {
        let mut user = User {
            id: 7,
            name: "Thomas".to_string(),
            email: "thomas@example.com".to_string(),
            posts: None,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({ "id": 7, "name": "Thomas", "email": "thomas@example.com" })
        );
        let decoded: User = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.posts, None);

        user.posts = Some(Vec::new());
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["posts"], json!([]));
    }
}
