//! filedepot - Multi-user file management backend
//!
//! A record-management service with ownership-scoped file upload, download
//! and deletion, filename-conflict resolution with explicit replacement,
//! durable blob storage, and dashboard aggregation.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository, UserUpdate};
pub use error::{DepotError, Result};
pub use file::{
    DashboardStats, DownloadResult, FileKind, FileRecord, FileRepository, FileService,
    FileStorage, NewFileRecord, UploadRequest,
};
pub use web::WebServer;
