//! Blob storage backend for filedepot.
//!
//! This module provides durable key/blob storage on the local filesystem:
//! - UUID-based storage keys, attributable to the uploading owner
//! - Directory sharding by first 2 characters of the key
//! - All-or-nothing writes (temp file + rename)
//! - Absence-tolerant deletes

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{DepotError, Result};

/// Filesystem-backed blob store.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012-u7.txt
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890-u2.pdf
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Generate a storage key for an owner's upload.
    ///
    /// The UUID component makes keys unique across all time, including
    /// concurrent uploads of the same filename at the same instant; the
    /// owner component keeps blobs attributable during operational cleanup.
    pub fn generate_key(owner_id: i64, original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}-u{owner_id}.{ext}")
    }

    /// Write a blob under the given key.
    ///
    /// The write is all-or-nothing: content goes to a temp file in the
    /// target shard and a single rename publishes it. A failed write leaves
    /// no partial blob visible under the key.
    pub fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        let path = self.blob_path(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_file_name(format!("{key}.part"));
        if let Err(e) = fs::write(&tmp, content) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        Ok(())
    }

    /// Read a blob's content.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(key);

        match fs::read(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("blob {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it was already
    /// absent. Absence is not an error; any other failure is.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let path = self.blob_path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists.
    pub fn exists(&self, key: &str) -> bool {
        self.blob_path(key).exists()
    }

    /// Get the size of a stored blob.
    pub fn blob_size(&self, key: &str) -> Result<u64> {
        let path = self.blob_path(key);

        match fs::metadata(&path) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("blob {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the full filesystem path for a storage key.
    ///
    /// The path is constructed as: {base_path}/{shard}/{key}
    /// where shard is the first 2 characters of the key (UUID prefix).
    pub fn blob_path(&self, key: &str) -> PathBuf {
        let shard = Self::get_shard(key);
        self.base_path.join(shard).join(key)
    }

    /// Get the shard directory name for a storage key.
    fn get_shard(key: &str) -> &str {
        if key.len() >= 2 {
            &key[..2]
        } else {
            key
        }
    }

    /// Extract the file extension from a filename.
    ///
    /// Returns "bin" if no extension is found.
    fn extract_extension(filename: &str) -> &str {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("blobs");

        assert!(!storage_path.exists());

        let storage = FileStorage::new(&storage_path).unwrap();

        assert!(storage_path.exists());
        assert_eq!(storage.base_path(), storage_path);
    }

    #[test]
    fn test_put_and_get() {
        let (_temp_dir, storage) = setup_storage();
        let content = b"Hello, World!";

        let key = FileStorage::generate_key(1, "test.txt");
        storage.put(&key, content).unwrap();

        let loaded = storage.get(&key).unwrap();
        assert_eq!(loaded, content);
    }

    #[test]
    fn test_generate_key_unique() {
        let key1 = FileStorage::generate_key(1, "test.txt");
        let key2 = FileStorage::generate_key(1, "test.txt");

        assert_ne!(key1, key2);
        assert!(key1.ends_with("-u1.txt"));
        assert!(key2.ends_with("-u1.txt"));
    }

    #[test]
    fn test_generate_key_extension() {
        let key = FileStorage::generate_key(3, "document.PDF");
        assert!(key.ends_with("-u3.PDF"));

        let key = FileStorage::generate_key(3, "no_extension");
        assert!(key.ends_with("-u3.bin"));
    }

    #[test]
    fn test_put_creates_shard_directory() {
        let (_temp_dir, storage) = setup_storage();

        let key = FileStorage::generate_key(1, "test.txt");
        storage.put(&key, b"data").unwrap();

        let shard_dir = storage.base_path().join(&key[..2]);
        assert!(shard_dir.is_dir());
    }

    #[test]
    fn test_put_leaves_no_temp_file() {
        let (_temp_dir, storage) = setup_storage();

        let key = FileStorage::generate_key(1, "test.txt");
        storage.put(&key, b"data").unwrap();

        let shard_dir = storage.base_path().join(&key[..2]);
        let entries: Vec<_> = fs::read_dir(&shard_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec![key]);
    }

    #[test]
    fn test_get_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let result = storage.get("nonexistent.txt");

        assert!(matches!(result, Err(DepotError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, storage) = setup_storage();

        let key = FileStorage::generate_key(1, "delete.txt");
        storage.put(&key, b"to delete").unwrap();
        assert!(storage.exists(&key));

        let deleted = storage.delete(&key).unwrap();
        assert!(deleted);
        assert!(!storage.exists(&key));
    }

    #[test]
    fn test_delete_absent_is_ok() {
        let (_temp_dir, storage) = setup_storage();

        let deleted = storage.delete("nonexistent.txt").unwrap();
        assert!(!deleted);
    }

    #[test]
    fn test_blob_size() {
        let (_temp_dir, storage) = setup_storage();
        let content = b"Hello, World!";

        let key = FileStorage::generate_key(1, "test.txt");
        storage.put(&key, content).unwrap();

        assert_eq!(storage.blob_size(&key).unwrap(), content.len() as u64);
    }

    #[test]
    fn test_blob_size_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let result = storage.blob_size("nonexistent.txt");
        assert!(matches!(result, Err(DepotError::NotFound(_))));
    }

    #[test]
    fn test_blob_path() {
        let (_temp_dir, storage) = setup_storage();

        let key = "ab12cd34-5678-90ab-cdef-123456789012-u1.txt";
        let path = storage.blob_path(key);

        assert_eq!(path, storage.base_path().join("ab").join(key));
    }

    #[test]
    fn test_get_shard() {
        assert_eq!(FileStorage::get_shard("abcdef.txt"), "ab");
        assert_eq!(FileStorage::get_shard("12-345.bin"), "12");
        assert_eq!(FileStorage::get_shard("x"), "x");
        assert_eq!(FileStorage::get_shard(""), "");
    }

    #[test]
    fn test_extract_extension() {
        assert_eq!(FileStorage::extract_extension("test.txt"), "txt");
        assert_eq!(FileStorage::extract_extension("document.PDF"), "PDF");
        assert_eq!(FileStorage::extract_extension("no_ext"), "bin");
        assert_eq!(FileStorage::extract_extension("file.tar.gz"), "gz");
        assert_eq!(FileStorage::extract_extension(".hidden"), "bin");
    }

    #[test]
    fn test_overwrite_same_key() {
        let (_temp_dir, storage) = setup_storage();

        let key = FileStorage::generate_key(1, "test.txt");
        storage.put(&key, b"first").unwrap();
        storage.put(&key, b"second").unwrap();

        assert_eq!(storage.get(&key).unwrap(), b"second");
    }

    #[test]
    fn test_binary_content() {
        let (_temp_dir, storage) = setup_storage();

        let content: Vec<u8> = (0..=255).collect();

        let key = FileStorage::generate_key(1, "binary.bin");
        storage.put(&key, &content).unwrap();

        assert_eq!(storage.get(&key).unwrap(), content);
    }

    #[test]
    fn test_large_blob() {
        let (_temp_dir, storage) = setup_storage();

        let content: Vec<u8> = vec![0xAB; 1024 * 1024];

        let key = FileStorage::generate_key(1, "large.bin");
        storage.put(&key, &content).unwrap();

        assert_eq!(storage.blob_size(&key).unwrap(), 1024 * 1024);
        assert_eq!(storage.get(&key).unwrap(), content);
    }

    #[test]
    fn test_unicode_original_name() {
        let (_temp_dir, storage) = setup_storage();

        let key = FileStorage::generate_key(1, "日本語ファイル.txt");
        assert!(key.ends_with(".txt"));
        storage.put(&key, b"data").unwrap();
        assert_eq!(storage.get(&key).unwrap(), b"data");
    }
}
