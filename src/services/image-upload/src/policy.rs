//! Upload acceptance policy
//!
//! Decides whether an inbound file is accepted, where it is written and under
//! which name. The registry of accepted MIME types is fixed at compile time;
//! the target directory and the byte limit come from configuration and are
//! immutable once [`UploadPolicy::initialize`] has run.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config_types::UploadConfig,
    error::{UploadError, UploadResult},
    models::FileDescriptor,
    utils::size::{format_bytes, format_bytes_exact},
};

/// Accepted MIME types and the extension stored files receive
const MIME_TYPE_MAP: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpeg"),
    ("image/jpg", "jpg"),
];

/// Canonical extension for an accepted MIME type
pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    MIME_TYPE_MAP
        .iter()
        .find(|(accepted, _)| *accepted == mime_type)
        .map(|(_, ext)| *ext)
}

/// Single acceptance predicate shared by filtering and filename resolution
pub fn is_accepted_mime_type(mime_type: &str) -> bool {
    extension_for(mime_type).is_some()
}

/// All MIME types in the registry
pub fn accepted_mime_types() -> impl Iterator<Item = &'static str> {
    MIME_TYPE_MAP.iter().map(|(mime, _)| *mime)
}

/// Create the upload directory and any missing parents.
///
/// Safe to call repeatedly and from concurrent tasks.
pub async fn ensure_upload_directory(path: &Path) -> UploadResult<()> {
    tokio::fs::create_dir_all(path).await.map_err(|e| {
        UploadError::IoError {
            message: format!(
                "Failed to create upload directory {}: {}",
                path.display(),
                e
            ),
        }
    })?;

    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_dir() {
        return Err(UploadError::ConfigurationError {
            message: format!("Upload path {} is not a directory", path.display()),
        });
    }

    Ok(())
}

/// Image upload policy
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    upload_dir: PathBuf,
    max_file_size: u64,
    size_limit_message: String,
}

impl UploadPolicy {
    /// Build a policy without touching the filesystem
    pub fn new(upload_dir: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_file_size,
            size_limit_message: format!(
                "File size exceeds the {} limit",
                format_bytes_exact(max_file_size)
            ),
        }
    }

    /// Build a policy from configuration and ensure its directory exists.
    ///
    /// This is the one startup step that has a filesystem side effect.
    pub async fn initialize(config: &UploadConfig) -> UploadResult<Self> {
        config.validate()?;

        let policy = Self::new(config.upload_dir(), config.max_file_size);
        ensure_upload_directory(&policy.upload_dir).await?;

        info!(
            "Upload directory ready at {} (limit {})",
            policy.upload_dir.display(),
            format_bytes(policy.max_file_size)
        );

        Ok(policy)
    }

    /// Directory uploads are written into
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Directory every accepted file is written into
    pub fn resolve_destination(&self, _file: &FileDescriptor) -> &Path {
        &self.upload_dir
    }

    /// Generate a fresh `<uuid>.<ext>` name for an accepted file
    pub fn resolve_filename(&self, file: &FileDescriptor) -> UploadResult<String> {
        let ext = extension_for(&file.mime_type)
            .ok_or_else(|| UploadError::invalid_file_type(file.mime_type.as_str()))?;

        Ok(format!("{}.{}", Uuid::new_v4(), ext))
    }

    /// Accept or reject a file based on its declared MIME type
    pub fn filter(&self, file: &FileDescriptor) -> UploadResult<()> {
        if is_accepted_mime_type(&file.mime_type) {
            debug!(
                "Accepted {} upload in field {}",
                file.mime_type, file.field_name
            );
            Ok(())
        } else {
            warn!(
                "Rejected upload with MIME type {:?} in field {}",
                file.mime_type, file.field_name
            );
            Err(UploadError::invalid_mime_type(file.mime_type.as_str()))
        }
    }

    /// Byte limit the storage layer enforces
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// User-facing text for a size-limit violation
    pub fn size_limit_message(&self) -> &str {
        &self.size_limit_message
    }

    /// Rewrite a size-limit violation into its user-facing form.
    ///
    /// Every other error is returned untouched.
    pub fn on_size_exceeded(&self, error: UploadError) -> UploadError {
        if error.is_size_exceeded() {
            UploadError::file_size_exceeded(self.max_file_size, self.size_limit_message.as_str())
        } else {
            error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::new("uploads/images", 500_000)
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/gif"), None);
        // Exact match only
        assert_eq!(extension_for("IMAGE/PNG"), None);
        assert_eq!(extension_for("image/png; charset=binary"), None);
    }

    #[test]
    fn test_size_limit_message_follows_limit() {
        assert_eq!(
            policy().size_limit_message(),
            "File size exceeds the 500 KB limit"
        );
        assert_eq!(
            UploadPolicy::new("x", 2_000_000).size_limit_message(),
            "File size exceeds the 2 MB limit"
        );
    }

    #[test]
    fn test_size_limit_message_is_exact_for_uneven_limits() {
        assert_eq!(
            UploadPolicy::new("x", 499_999).size_limit_message(),
            "File size exceeds the 499999 bytes limit"
        );
        assert_eq!(
            UploadPolicy::new("x", 999_999).size_limit_message(),
            "File size exceeds the 999999 bytes limit"
        );
        assert_eq!(
            UploadPolicy::new("x", 1_499).size_limit_message(),
            "File size exceeds the 1499 bytes limit"
        );
    }

    #[test]
    fn test_on_size_exceeded_passes_other_errors_through() {
        let error = policy().on_size_exceeded(UploadError::invalid_mime_type("text/plain"));

        assert!(matches!(error, UploadError::InvalidMimeType { .. }));
        assert_eq!(error.to_string(), "Invalid mime type!");
    }

    #[test]
    fn test_on_size_exceeded_sets_configured_limit() {
        let error = policy().on_size_exceeded(UploadError::file_size_exceeded(0, "stream limit"));

        match error {
            UploadError::FileSizeExceeded { limit, message } => {
                assert_eq!(limit, 500_000);
                assert_eq!(message, "File size exceeds the 500 KB limit");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_initialize_rejects_zero_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig {
            root_dir: dir.path().to_path_buf(),
            max_file_size: 0,
            ..UploadConfig::default()
        };

        let result = UploadPolicy::initialize(&config).await;
        assert!(matches!(result, Err(UploadError::ConfigurationError { .. })));
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_ensure_upload_directory_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("not-a-dir");
        std::fs::write(&file_path, b"x").unwrap();

        assert!(ensure_upload_directory(&file_path).await.is_err());
    }
}
