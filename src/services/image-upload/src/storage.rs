//! Disk storage for accepted uploads
//!
//! Streams an upload into the directory chosen by the [`UploadPolicy`],
//! enforcing the policy's byte limit while the data arrives. Partial files
//! are removed on every failure path.

use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::{
    error::{UploadError, UploadResult},
    models::{FileDescriptor, StoredFile},
    policy::UploadPolicy,
};

/// Raw message for an over-sized stream, before the policy rewrites it
const RAW_SIZE_EXCEEDED_MESSAGE: &str = "File too large";

/// Local disk storage backend
#[derive(Debug, Clone, Default)]
pub struct DiskStorage;

impl DiskStorage {
    pub fn new() -> Self {
        Self
    }

    /// Persist a byte stream under a policy-generated name.
    ///
    /// The descriptor is filtered before the file is created; nothing touches
    /// the disk for a rejected MIME type.
    pub async fn persist<S, E>(
        &self,
        policy: &UploadPolicy,
        descriptor: &FileDescriptor,
        stream: S,
    ) -> UploadResult<StoredFile>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<UploadError>,
    {
        policy.filter(descriptor)?;

        let directory = policy.resolve_destination(descriptor).to_path_buf();
        let file_name = policy.resolve_filename(descriptor)?;
        let path = directory.join(&file_name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!("Writing upload to {}", path.display());

        let max_file_size = policy.max_file_size();
        let mut bytes_written: u64 = 0;
        let mut stream = std::pin::pin!(stream);

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    drop(file);
                    cleanup_partial_file(&path).await;
                    return Err(err.into());
                }
            };

            bytes_written = bytes_written.saturating_add(chunk.len() as u64);
            if bytes_written > max_file_size {
                drop(file);
                cleanup_partial_file(&path).await;
                warn!(
                    "Upload {} exceeded the {} byte limit",
                    file_name, max_file_size
                );
                return Err(UploadError::file_size_exceeded(
                    max_file_size,
                    RAW_SIZE_EXCEEDED_MESSAGE,
                ));
            }

            if let Err(err) = file.write_all(&chunk).await {
                drop(file);
                cleanup_partial_file(&path).await;
                return Err(err.into());
            }
        }

        if let Err(err) = file.flush().await {
            drop(file);
            cleanup_partial_file(&path).await;
            return Err(err.into());
        }

        info!(
            "Stored {} as {} ({} bytes, {})",
            descriptor.original_name.as_deref().unwrap_or("<unnamed>"),
            file_name,
            bytes_written,
            descriptor.mime_type
        );

        Ok(StoredFile {
            file_name,
            directory,
            path,
            size: bytes_written,
            mime_type: descriptor.mime_type.clone(),
        })
    }

    /// Check that the upload directory is still present
    pub async fn health_check(&self, directory: &Path) -> UploadResult<()> {
        let metadata = fs::metadata(directory).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(UploadError::ConfigurationError {
                message: format!("{} is not a directory", directory.display()),
            })
        }
    }
}

async fn cleanup_partial_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial upload {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => error!("Failed to remove partial upload {}: {}", path.display(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: Vec<Vec<u8>>) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    fn png() -> FileDescriptor {
        FileDescriptor::new("image", "image/png")
    }

    #[tokio::test]
    async fn test_persist_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let policy = UploadPolicy::new(dir.path(), 1_000);

        let stored = DiskStorage::new()
            .persist(&policy, &png(), chunks(vec![b"abc".to_vec(), b"def".to_vec()]))
            .await
            .unwrap();

        assert_eq!(stored.size, 6);
        assert_eq!(stored.directory, dir.path());
        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_persist_accepts_exact_limit() {
        let dir = tempfile::tempdir().unwrap();
        let policy = UploadPolicy::new(dir.path(), 8);

        let stored = DiskStorage::new()
            .persist(&policy, &png(), chunks(vec![vec![0u8; 4], vec![1u8; 4]]))
            .await
            .unwrap();

        assert_eq!(stored.size, 8);
    }

    #[tokio::test]
    async fn test_persist_over_limit_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let policy = UploadPolicy::new(dir.path(), 8);

        let err = DiskStorage::new()
            .persist(&policy, &png(), chunks(vec![vec![0u8; 5], vec![0u8; 5]]))
            .await
            .unwrap_err();

        assert!(err.is_size_exceeded());
        assert_eq!(err.to_string(), "File too large");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_persist_rejected_type_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let policy = UploadPolicy::new(dir.path(), 1_000);
        let descriptor = FileDescriptor::new("image", "image/gif");

        let err = DiskStorage::new()
            .persist(&policy, &descriptor, chunks(vec![b"GIF89a".to_vec()]))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidMimeType { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_persist_stream_error_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let policy = UploadPolicy::new(dir.path(), 1_000);
        let parts: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ];

        let err = DiskStorage::new()
            .persist(&policy, &png(), stream::iter(parts))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::IoError { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new();

        assert!(storage.health_check(dir.path()).await.is_ok());
        assert!(storage
            .health_check(&dir.path().join("missing"))
            .await
            .is_err());
    }
}
