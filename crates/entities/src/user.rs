//! User-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Regular customer.
    User,
    /// Back-office administrator.
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

/// A user in the system, created on first authenticated access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Subject identifier assigned by the external identity provider.
    pub external_id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Profile image URL.
    pub image_url: Option<String>,
    /// Role.
    pub role: UserRole,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with the default role.
    pub fn new(external_id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            email: email.into(),
            name: None,
            image_url: None,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Returns true if the user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("provider|123", "test@example.com").with_name("Test User");

        assert_eq!(user.external_id, "provider|123");
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.name, Some("Test User".to_string()));
        assert_eq!(user.role, UserRole::User);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_admin_role() {
        let user = User::new("provider|456", "admin@example.com").with_role(UserRole::Admin);
        assert!(user.is_admin());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&UserRole::User).unwrap(), "\"USER\"");
    }
}
