//! User model for filedepot.
//!
//! Owners are plain account records. Credentials and token issuance live in
//! an external auth collaborator; this service only consumes resolved ids.

use chrono::{DateTime, Utc};

/// User entity representing a registered owner account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique).
    pub username: String,
    /// Email address (unique).
    pub email: String,
    /// Phone number (optional).
    pub phone_number: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Phone number (optional).
    pub phone_number: Option<String>,
}

impl NewUser {
    /// Create a new user with the required fields.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            phone_number: None,
        }
    }

    /// Set the phone number.
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }
}

/// Data for updating an existing user.
///
/// Only fields that are set will be modified.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New username.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New phone number (None clears it).
    pub phone_number: Option<Option<String>>,
    /// New active status.
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the update contains no changes.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.is_active.is_none()
    }
}
