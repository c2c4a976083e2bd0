//! File metadata types and repository for filedepot.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::kind::FileKind;
use crate::{DepotError, Result};

/// Metadata row describing one stored file.
///
/// Records are immutable once created; replacement is delete+recreate.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Owning user ID.
    pub owner_id: i64,
    /// Original filename (display name, not unique).
    pub filename: String,
    /// Classified file type.
    pub kind: FileKind,
    /// Opaque locator into the storage backend (unique).
    pub storage_key: String,
    /// File size in bytes.
    pub size: i64,
    /// When the file was uploaded.
    pub uploaded_at: DateTime<Utc>,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Owning user ID.
    pub owner_id: i64,
    /// Original filename (display name).
    pub filename: String,
    /// Classified file type.
    pub kind: FileKind,
    /// Storage backend key.
    pub storage_key: String,
    /// File size in bytes.
    pub size: i64,
}

impl NewFileRecord {
    /// Create a new NewFileRecord.
    pub fn new(
        owner_id: i64,
        filename: impl Into<String>,
        kind: FileKind,
        storage_key: impl Into<String>,
        size: i64,
    ) -> Self {
        Self {
            owner_id,
            filename: filename.into(),
            kind,
            storage_key: storage_key.into(),
            size,
        }
    }
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new file record.
    pub async fn create(&self, file: &NewFileRecord) -> Result<FileRecord> {
        let result = sqlx::query(
            "INSERT INTO files (owner_id, filename, kind, storage_key, size)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(file.owner_id)
        .bind(&file.filename)
        .bind(file.kind)
        .bind(&file.storage_key)
        .bind(file.size)
        .execute(self.pool)
        .await
        .map_err(|e| DepotError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DepotError::NotFound("file".to_string()))
    }

    /// Get a file record by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            "SELECT id, owner_id, filename, kind, storage_key, size, uploaded_at
             FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(record)
    }

    /// Get a file record by ID, scoped to an owner.
    ///
    /// An id owned by a different user yields None, indistinguishable from
    /// an absent id.
    pub async fn get_by_owner(&self, owner_id: i64, id: i64) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            "SELECT id, owner_id, filename, kind, storage_key, size, uploaded_at
             FROM files WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(record)
    }

    /// Look up an owner's file by display filename.
    pub async fn find_by_owner_and_filename(
        &self,
        owner_id: i64,
        filename: &str,
    ) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            "SELECT id, owner_id, filename, kind, storage_key, size, uploaded_at
             FROM files WHERE owner_id = ? AND filename = ?",
        )
        .bind(owner_id)
        .bind(filename)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(record)
    }

    /// List an owner's files in stable insertion order.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(
            "SELECT id, owner_id, filename, kind, storage_key, size, uploaded_at
             FROM files WHERE owner_id = ? ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(records)
    }

    /// Delete a file record by ID.
    ///
    /// Returns true if a record was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DepotError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all file records.
    pub async fn count_all(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await
            .map_err(|e| DepotError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Count files grouped by kind. Kinds with no files are absent.
    pub async fn count_by_kind(&self) -> Result<Vec<(FileKind, i64)>> {
        let counts: Vec<(FileKind, i64)> =
            sqlx::query_as("SELECT kind, COUNT(*) FROM files GROUP BY kind")
                .fetch_all(self.pool)
                .await
                .map_err(|e| DepotError::Database(e.to_string()))?;
        Ok(counts)
    }

    /// Count files per owner, keyed by username.
    ///
    /// Owners with zero files are included.
    pub async fn count_per_owner(&self) -> Result<Vec<(String, i64)>> {
        let counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT u.username, COUNT(f.id)
             FROM users u LEFT JOIN files f ON f.owner_id = u.id
             GROUP BY u.id ORDER BY u.username",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| DepotError::Database(e.to_string()))?;
        Ok(counts)
    }
}
