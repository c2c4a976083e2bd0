//! File management module for filedepot.
//!
//! This module provides ownership-scoped file upload/download functionality:
//! - Extension-based file classification
//! - Filename conflict resolution with explicit replacement
//! - Durable blob storage with all-or-nothing writes
//! - File metadata management and dashboard aggregation

mod kind;
mod metadata;
mod service;
mod storage;

pub use kind::FileKind;
pub use metadata::{FileRecord, FileRepository, NewFileRecord};
pub use service::{DashboardStats, DownloadResult, FileService, UploadRequest};
pub use storage::FileStorage;

/// Maximum length for filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 100;

/// Default maximum file size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
