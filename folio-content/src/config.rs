//! Server configuration

use std::path::PathBuf;

/// Environment variable holding the hex-encoded AES-256 secret.
pub const SECRET_ENV: &str = "FOLIO_ENCRYPTION_SECRET";

/// Size of each plaintext/ciphertext read during ingest and delivery.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingSecret(String),

    #[error("secret key is not valid hex: {0}")]
    SecretEncoding(String),

    #[error("secret key must be {expected} bytes, got {actual}")]
    SecretLength { expected: usize, actual: usize },

    #[error("failed to prepare directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for the content server
#[derive(Debug, Clone)]
pub struct ContentServerConfig {
    /// Directory that holds the encrypted files
    pub content_dir: PathBuf,
    /// Directory used to spool raw uploads before encryption
    pub upload_dir: PathBuf,
    /// Upper bound on a single upload body in bytes
    pub max_upload_bytes: u64,
    /// Read buffer size for the ingest and decrypt pipelines
    pub read_chunk_size: usize,
}

impl Default for ContentServerConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            upload_dir: PathBuf::from("temp_uploads"),
            max_upload_bytes: 2 * 1024 * 1024 * 1024,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl ContentServerConfig {
    /// Creates the content and upload directories if they are missing
    pub fn prepare_dirs(&self) -> Result<(), ConfigError> {
        for dir in [&self.content_dir, &self.upload_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Directory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
