//! Request handlers for the filedepot Web API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::db::{Database, NewUser, UserRepository, UserUpdate};
use crate::file::{FileService, FileStorage, UploadRequest};

use super::dto::{
    ApiResponse, CreateUserRequest, FileRecordDto, MessageDto, UpdateUserRequest, UserDto,
};
use super::error::ApiError;
use super::middleware::OwnerIdentity;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Shared application state for the Web API.
pub struct AppState {
    /// Database handle.
    pub db: SharedDatabase,
    /// File service.
    pub files: FileService,
    /// Maximum accepted upload size in bytes.
    max_upload_bytes: u64,
}

impl AppState {
    /// Create the application state.
    pub fn new(db: SharedDatabase, storage: FileStorage, max_upload_bytes: u64) -> Self {
        let files = FileService::new(db.clone(), storage).with_max_file_size(max_upload_bytes);
        Self {
            db,
            files,
            max_upload_bytes,
        }
    }

    /// Request body limit for the upload route.
    ///
    /// Slightly above the content limit to leave room for multipart framing.
    pub fn upload_body_limit(&self) -> usize {
        self.max_upload_bytes as usize + 64 * 1024
    }
}

/// POST /api/upload - upload a file for the authenticated owner.
///
/// Multipart form: a `file` part plus an optional `replace_existing` text
/// part ("true"/"1" enables replacement of a same-named prior upload).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileRecordDto>>, ApiError> {
    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut replace_existing = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart request: {e}")))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file part: {e}")))?;
                content = Some(bytes.to_vec());
            }
            Some("replace_existing") => {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed to read replace_existing: {e}"))
                })?;
                replace_existing = matches!(value.trim(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| ApiError::bad_request("missing file part"))?;
    let content = content.ok_or_else(|| ApiError::bad_request("missing file part"))?;

    let request = UploadRequest::new(filename, content).with_replace_existing(replace_existing);
    let record = state.files.upload(&request, owner.id).await?;

    Ok(Json(ApiResponse::new(record.into())))
}

/// GET /api/files - list the authenticated owner's files.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
) -> Result<Json<ApiResponse<Vec<FileRecordDto>>>, ApiError> {
    let records = state.files.list(owner.id).await?;
    let dtos = records.into_iter().map(FileRecordDto::from).collect();
    Ok(Json(ApiResponse::new(dtos)))
}

/// GET /api/files/{id}/download - stream a file's content.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let result = state.files.fetch_content(owner.id, file_id).await?;

    let mime = mime_guess::from_path(&result.record.filename).first_or_octet_stream();
    let headers = [
        (header::CONTENT_TYPE, mime.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", result.record.filename),
        ),
    ];

    Ok((headers, result.content).into_response())
}

/// DELETE /api/files/{id} - delete the owner's file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state.files.delete(owner.id, file_id).await?;
    Ok(Json(ApiResponse::new(MessageDto::new(
        "File deleted successfully",
    ))))
}

/// GET /api/dashboard/stats - aggregate statistics.
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(_owner): OwnerIdentity,
) -> Result<Json<ApiResponse<crate::file::DashboardStats>>, ApiError> {
    let stats = state.files.dashboard_stats().await?;
    Ok(Json(ApiResponse::new(stats)))
}

/// POST /api/users - provision an owner account.
///
/// Called by the external auth collaborator when an account is created.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    payload
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let mut new_user = NewUser::new(payload.username, payload.email);
    if let Some(phone_number) = payload.phone_number {
        new_user = new_user.with_phone_number(phone_number);
    }

    let user = UserRepository::new(state.db.pool()).create(&new_user).await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// GET /api/users/me - the authenticated owner's account.
pub async fn me(
    OwnerIdentity(owner): OwnerIdentity,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    Ok(Json(ApiResponse::new(owner.into())))
}

/// PUT /api/users/me - update the authenticated owner's account.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    payload
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let repo = UserRepository::new(state.db.pool());

    // Reject identifiers already taken by another account
    if let Some(ref email) = payload.email {
        if !email.eq_ignore_ascii_case(&owner.email) && repo.email_exists(email).await? {
            return Err(ApiError::bad_request("Email already registered"));
        }
    }
    if let Some(ref username) = payload.username {
        if !username.eq_ignore_ascii_case(&owner.username) && repo.username_exists(username).await?
        {
            return Err(ApiError::bad_request("Username already taken"));
        }
    }

    let update = UserUpdate {
        username: payload.username,
        email: payload.email,
        phone_number: payload.phone_number.map(Some),
        is_active: None,
    };

    let user = repo
        .update(owner.id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(ApiResponse::new(user.into())))
}
