//! Remote file storage. Uploads return an opaque path that later steps
//! (the key-value record, the feedback request) refer back to.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod s3;

pub use s3::S3FileStore;

/// A file as received from the client or produced by conversion.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Metadata returned by the store once a file has been written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A file read back from the store, with the content type it was written with.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("object not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<StoredFile, StorageError>;

    async fn read(&self, path: &str) -> Result<StoredObject, StorageError>;
}

/// Builds the object key for a new upload: `uploads/{id}/{sanitized-name}`.
pub fn object_key(id: Uuid, file_name: &str) -> String {
    format!("uploads/{}/{}", id, sanitize_file_name(file_name))
}

/// Drops any directory components and replaces characters outside
/// `[A-Za-z0-9._-]` with underscores.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name).trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
