//! Data models for the image upload service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};

/// Inbound file as announced by the multipart layer, before any bytes are read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Multipart field the file arrived in
    pub field_name: String,
    /// Client-supplied filename, never used for storage
    pub original_name: Option<String>,
    /// Declared MIME type
    pub mime_type: String,
}

impl FileDescriptor {
    pub fn new<S: Into<String>>(field_name: S, mime_type: S) -> Self {
        Self {
            field_name: field_name.into(),
            original_name: None,
            mime_type: mime_type.into(),
        }
    }

    pub fn with_original_name<S: Into<String>>(mut self, name: S) -> Self {
        self.original_name = Some(name.into());
        self
    }
}

/// Record of a file persisted to the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated `<uuid>.<ext>` name
    pub file_name: String,
    /// Directory the file was written into
    pub directory: PathBuf,
    /// Full path on disk
    pub path: PathBuf,
    /// Bytes written
    pub size: u64,
    /// Declared MIME type the extension was derived from
    pub mime_type: String,
}

/// Response body for a successful upload.
///
/// Only the generated name and public URL identify the file; disk paths stay
/// on the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
    /// Public URL the image is served under
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub services: HashMap<String, bool>,
}
