//! Blob storage for admission documents.
//!
//! Photos, birth certificates and transfer certificates uploaded with an
//! application live behind the [`FileStorage`] trait so the backend can be
//! swapped (local disk today, an object store later) without touching the
//! admission code.
//!
//! # Example
//!
//! ```ignore
//! use admitdesk_core::file_storage::{LocalFileStorage, upload_document};
//!
//! let storage = LocalFileStorage::new("./uploads".into(), "http://localhost:3000/files".into());
//! let stored = upload_document(&storage, "admissions/ADM251234", "photo.jpg", &bytes).await?;
//! println!("{}", stored.url);
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde::Serialize;
use tokio::fs;

use crate::clock::now_millis;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Abstract blob storage backend.
pub trait FileStorage: Send + Sync {
    /// Stores `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes `key`. Absent keys are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Public URL for `key`.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    /// Maps a URL produced by [`FileStorage::get_url`] back to its key.
    ///
    /// Anything that is not one of this backend's URLs is returned as-is and
    /// treated as a key.
    fn key_from_url<'a>(&self, url_or_key: &'a str) -> &'a str;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Document is larger than the {max_bytes} byte limit")]
    TooLarge { max_bytes: usize },

    /// Key is empty, absolute, escapes the base directory or has odd characters.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Documents on the local disk, served over HTTP under `base_url`.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    root: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl LocalFileStorage {
    /// Default upload ceiling: 5 MiB.
    pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self::with_max_size(root, base_url, Self::DEFAULT_MAX_BYTES)
    }

    pub fn with_max_size(root: PathBuf, base_url: String, max_bytes: usize) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        let escapes = key.contains("..") || key.starts_with(['/', '\\']);
        if key.is_empty() || escapes {
            return Err(StorageError::InvalidKey(format!(
                "'{key}' is empty, absolute or escapes the upload root"
            )));
        }

        let allowed = |c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '/' | '.');
        if let Some(bad) = key.chars().find(|c| !allowed(*c)) {
            return Err(StorageError::InvalidKey(format!(
                "'{key}' contains '{bad}'"
            )));
        }

        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            let target = self.path_for(key)?;
            if content.len() > self.max_bytes {
                return Err(StorageError::TooLarge {
                    max_bytes: self.max_bytes,
                });
            }

            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir).await?;
            }
            fs::write(&target, content).await?;

            tracing::debug!(storage.key = %key, storage.bytes = content.len(), "Document written");
            Ok(key.to_owned())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let target = self.path_for(key)?;
            match fs::remove_file(&target).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url, key))
    }

    fn key_from_url<'a>(&self, url_or_key: &'a str) -> &'a str {
        url_or_key
            .strip_prefix(self.base_url.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(url_or_key)
    }
}

/// A document that has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub key: String,
    pub url: String,
}

/// Replaces every character a storage key would reject with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // a bare ".." survives the character filter
    cleaned.replace("..", "_")
}

/// Uploads a document under `{prefix}/{millis}_{file_name}` and returns its key and URL.
pub async fn upload_document(
    storage: &dyn FileStorage,
    prefix: &str,
    file_name: &str,
    content: &[u8],
) -> Result<StoredDocument, StorageError> {
    let key = format!(
        "{}/{}_{}",
        prefix.trim_matches('/'),
        now_millis(),
        sanitize_file_name(file_name)
    );
    let key = storage.save(&key, content).await?;
    let url = storage.get_url(&key)?;

    Ok(StoredDocument { key, url })
}

/// Deletes a document given either its public URL or its storage key.
pub async fn delete_document(storage: &dyn FileStorage, url_or_key: &str) -> Result<(), StorageError> {
    let key = storage.key_from_url(url_or_key);
    storage.delete(key).await
}
