//! Data transfer objects for the filedepot Web API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::User;
use crate::file::{FileKind, FileRecord};

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload in the response envelope.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Simple message payload.
#[derive(Debug, Serialize)]
pub struct MessageDto {
    /// Human-readable message.
    pub message: String,
}

impl MessageDto {
    /// Create a new message payload.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// File record representation returned by the API.
#[derive(Debug, Serialize)]
pub struct FileRecordDto {
    /// Unique file ID.
    pub id: i64,
    /// Original filename (display name).
    pub filename: String,
    /// Classified file type.
    pub file_type: FileKind,
    /// File size in bytes.
    pub size: i64,
    /// When the file was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Owning user ID.
    pub owner_id: i64,
}

impl From<FileRecord> for FileRecordDto {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            file_type: record.kind,
            size: record.size,
            uploaded_at: record.uploaded_at,
            owner_id: record.owner_id,
        }
    }
}

/// User representation returned by the API.
#[derive(Debug, Serialize)]
pub struct UserDto {
    /// Unique user ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Phone number (optional).
    pub phone_number: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Username.
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Phone number (optional).
    #[validate(length(max = 30, message = "Phone number must be at most 30 characters"))]
    pub phone_number: Option<String>,
}

/// Request body for updating the current user.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New username.
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: Option<String>,
    /// New email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// New phone number.
    #[validate(length(max = 30, message = "Phone number must be at most 30 characters"))]
    pub phone_number: Option<String>,
}
