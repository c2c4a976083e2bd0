//! File service for filedepot.
//!
//! This module coordinates uploads and serves ownership-scoped queries:
//! - Upload with filename-conflict resolution and explicit replacement
//! - Download and deletion scoped to the requesting owner
//! - Dashboard aggregation over the metadata store
//!
//! The upload workflow orders its steps "destructive action last": a prior
//! record is only removed once its blob is confirmed gone (or absent), and a
//! new record is only inserted once the new blob is durably written.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::{DepotError, Result};

use super::kind::{FileKind, ALL_KINDS};
use super::metadata::{FileRecord, FileRepository, NewFileRecord};
use super::storage::FileStorage;
use super::{DEFAULT_MAX_FILE_SIZE, MAX_FILENAME_LENGTH};

/// Request data for a file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original filename (display name).
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
    /// Replace an existing file with the same name instead of failing.
    pub replace_existing: bool,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            replace_existing: false,
        }
    }

    /// Set the replace-existing flag.
    pub fn with_replace_existing(mut self, replace_existing: bool) -> Self {
        self.replace_existing = replace_existing;
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File metadata.
    pub record: FileRecord,
    /// File content.
    pub content: Vec<u8>,
}

/// Aggregate statistics over the metadata store.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Total file count across all owners.
    pub total_files: i64,
    /// Count per file kind. All four kinds are always present.
    pub file_type_breakdown: BTreeMap<FileKind, i64>,
    /// Count per owner, keyed by username. Owners with zero files included.
    pub files_per_user: BTreeMap<String, i64>,
}

type PairLockMap = Mutex<HashMap<(i64, String), Arc<tokio::sync::Mutex<()>>>>;

/// Deletes a freshly written blob on drop unless disarmed.
///
/// Covers both a failed metadata insert and a client-aborted request whose
/// future is dropped between blob write and insert.
struct BlobGuard<'a> {
    storage: &'a FileStorage,
    key: &'a str,
    armed: bool,
}

impl<'a> BlobGuard<'a> {
    fn new(storage: &'a FileStorage, key: &'a str) -> Self {
        Self {
            storage,
            key,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for BlobGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.storage.delete(self.key) {
            Ok(_) => warn!(key = %self.key, "rolled back blob without a metadata record"),
            Err(e) => {
                // Cleanup itself can fail in degraded storage conditions;
                // the stranded blob needs operational remediation
                error!(key = %self.key, error = %e, "failed to clean up orphaned blob")
            }
        }
    }
}

/// Service for ownership-scoped file management.
pub struct FileService {
    db: Arc<Database>,
    storage: FileStorage,
    max_file_size: u64,
    upload_locks: PairLockMap,
}

impl FileService {
    /// Create a new FileService.
    pub fn new(db: Arc<Database>, storage: FileStorage) -> Self {
        Self {
            db,
            storage,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            upload_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a new FileService with a custom max file size.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Upload a file for the given owner.
    ///
    /// At most one live record exists per `(owner, filename)` pair. A
    /// duplicate name fails with a conflict error unless `replace_existing`
    /// is set, in which case the prior blob and record are removed first.
    ///
    /// # Errors
    ///
    /// - `Conflict` - duplicate filename without replace intent
    /// - `UnsupportedType` - extension outside pdf/xlsx/xls/txt/doc/docx
    /// - `ReplaceFailed` - prior blob deletion failed; prior record intact
    /// - `StorageWrite` - blob write failed; no metadata created
    /// - `MetadataWrite` - insert failed after the blob write; the blob is
    ///   cleaned up best-effort before this surfaces
    /// - `Validation` - filename or content size over the configured limits
    pub async fn upload(&self, request: &UploadRequest, owner_id: i64) -> Result<FileRecord> {
        if request.filename.chars().count() > MAX_FILENAME_LENGTH {
            return Err(DepotError::Validation(format!(
                "filename must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }

        if request.content.len() as u64 > self.max_file_size {
            let max_mb = self.max_file_size / 1024 / 1024;
            return Err(DepotError::Validation(format!(
                "file is too large (max {max_mb}MB)"
            )));
        }

        // Classification is pure, so an unsupported extension can never
        // leave side effects
        let kind = FileKind::from_filename(&request.filename)
            .ok_or_else(|| DepotError::UnsupportedType(request.filename.clone()))?;

        // Serialize lookup, conflict resolution and the metadata insert per
        // (owner, filename). Blob writes target fresh unique keys and need
        // no cross-request exclusion.
        let _pair_guard = self.lock_pair(owner_id, &request.filename).await;

        let repo = FileRepository::new(self.db.pool());

        if let Some(existing) = repo
            .find_by_owner_and_filename(owner_id, &request.filename)
            .await?
        {
            if !request.replace_existing {
                return Err(DepotError::Conflict(format!(
                    "a file named '{}' already exists",
                    request.filename
                )));
            }

            // Absence of the prior blob is tolerated; any other deletion
            // failure aborts with the prior record intact
            if let Err(e) = self.storage.delete(&existing.storage_key) {
                return Err(DepotError::ReplaceFailed(format!(
                    "could not delete prior blob {}: {e}",
                    existing.storage_key
                )));
            }
            repo.delete(existing.id).await?;
            info!(
                owner_id,
                filename = %request.filename,
                "removed prior upload for replacement"
            );
        }

        let storage_key = FileStorage::generate_key(owner_id, &request.filename);

        self.storage
            .put(&storage_key, &request.content)
            .map_err(|e| DepotError::StorageWrite(e.to_string()))?;

        // The blob is rolled back on any exit from here until the insert
        // commits, including a dropped (client-aborted) request future
        let cleanup = BlobGuard::new(&self.storage, &storage_key);

        let record = repo
            .create(&NewFileRecord::new(
                owner_id,
                &request.filename,
                kind,
                &storage_key,
                request.content.len() as i64,
            ))
            .await
            .map_err(|e| DepotError::MetadataWrite(e.to_string()))?;

        cleanup.disarm();

        info!(
            owner_id,
            file_id = record.id,
            filename = %record.filename,
            kind = %record.kind,
            size = record.size,
            "file uploaded"
        );

        Ok(record)
    }

    /// List the owner's files in stable insertion order.
    pub async fn list(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        FileRepository::new(self.db.pool())
            .list_by_owner(owner_id)
            .await
    }

    /// Fetch a file's metadata and content.
    ///
    /// An id that is absent or owned by a different user yields the same
    /// not-found error; existence of other owners' files is never leaked.
    pub async fn fetch_content(&self, owner_id: i64, file_id: i64) -> Result<DownloadResult> {
        let record = FileRepository::new(self.db.pool())
            .get_by_owner(owner_id, file_id)
            .await?
            .ok_or_else(|| DepotError::NotFound("file".to_string()))?;

        let content = match self.storage.get(&record.storage_key) {
            Ok(content) => content,
            Err(DepotError::NotFound(_)) => {
                error!(
                    file_id = record.id,
                    key = %record.storage_key,
                    "metadata references a missing blob"
                );
                return Err(DepotError::NotFound("file".to_string()));
            }
            Err(e) => return Err(e),
        };

        Ok(DownloadResult { record, content })
    }

    /// Delete a file owned by the requesting owner.
    ///
    /// Blob removal tolerates absence. A hard blob-removal failure is
    /// logged and metadata removal proceeds anyway; a stranded blob is
    /// acceptable residue, a stuck undeletable file is not.
    pub async fn delete(&self, owner_id: i64, file_id: i64) -> Result<()> {
        let repo = FileRepository::new(self.db.pool());

        let record = repo
            .get_by_owner(owner_id, file_id)
            .await?
            .ok_or_else(|| DepotError::NotFound("file".to_string()))?;

        if let Err(e) = self.storage.delete(&record.storage_key) {
            warn!(
                file_id = record.id,
                key = %record.storage_key,
                error = %e,
                "blob removal failed; deleting metadata anyway"
            );
        }

        repo.delete(record.id).await?;

        info!(owner_id, file_id, filename = %record.filename, "file deleted");
        Ok(())
    }

    /// Compute aggregate dashboard statistics.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let repo = FileRepository::new(self.db.pool());

        let total_files = repo.count_all().await?;

        // All four kinds are always present, zero if none
        let mut file_type_breakdown: BTreeMap<FileKind, i64> =
            ALL_KINDS.iter().map(|kind| (*kind, 0)).collect();
        for (kind, count) in repo.count_by_kind().await? {
            file_type_breakdown.insert(kind, count);
        }

        let files_per_user: BTreeMap<String, i64> =
            repo.count_per_owner().await?.into_iter().collect();

        Ok(DashboardStats {
            total_files,
            file_type_breakdown,
            files_per_user,
        })
    }

    /// Get the storage backend used by this service.
    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Get the configured max file size.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Acquire the upload lock for a `(owner, filename)` pair.
    ///
    /// Uncontended entries are reaped on the way in, so the map stays
    /// bounded by the number of in-flight uploads.
    async fn lock_pair(&self, owner_id: i64, filename: &str) -> OwnedMutexGuard<()> {
        let cell = {
            let mut locks = self.upload_locks.lock().expect("upload lock map poisoned");
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry((owner_id, filename.to_string())).or_default())
        };
        cell.lock_owned().await
    }
}
