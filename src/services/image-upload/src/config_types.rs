use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{UploadError, UploadResult};

/// Main configuration structure for the image upload service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload policy configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Upload policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Application root the upload directory is resolved against
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Upload subdirectory below `root_dir`
    #[serde(default = "default_sub_dir")]
    pub sub_dir: PathBuf,
    /// Maximum accepted file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Multipart field carrying the image
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// URL prefix stored images are served under
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

impl UploadConfig {
    /// Full path of the directory uploads are written into
    pub fn upload_dir(&self) -> PathBuf {
        self.root_dir.join(&self.sub_dir)
    }

    /// Reject values the router or the policy cannot work with
    pub fn validate(&self) -> UploadResult<()> {
        if self.max_file_size == 0 {
            return Err(invalid("upload.max_file_size", "must be greater than zero"));
        }
        if self.field_name.trim().is_empty() {
            return Err(invalid("upload.field_name", "must not be empty"));
        }
        let public_path = self.public_path.trim_end_matches('/');
        if !public_path.starts_with('/') || public_path.len() < 2 {
            return Err(invalid(
                "upload.public_path",
                "must be an absolute URL path other than /",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> UploadError {
    UploadError::ConfigurationError {
        message: format!("{} {}", key, reason),
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON logging
    #[serde(default = "default_false")]
    pub json_format: bool,
}

// Default value functions

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_sub_dir() -> PathBuf {
    PathBuf::from("uploads/images")
}

fn default_max_file_size() -> u64 {
    500_000 // 500 KB
}

fn default_field_name() -> String {
    "image".to_string()
}

fn default_public_path() -> String {
    "/uploads/images".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            sub_dir: default_sub_dir(),
            max_file_size: default_max_file_size(),
            field_name: default_field_name(),
            public_path: default_public_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: default_false(),
        }
    }
}
