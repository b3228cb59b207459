//! Plaintext → `[IV][ciphertext]` encoder used when content is uploaded.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::config::DEFAULT_READ_CHUNK_SIZE;
use crate::infrastructure::crypto::{CodecError, ContentCipher, EncryptTransform, Iv, IV_LEN};
use crate::infrastructure::encrypted_file::write_header;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("I/O error during ingest: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Outcome of a successful encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of plaintext bytes consumed
    pub plaintext_len: u64,
    /// Size of the file written, IV frame included
    pub encrypted_len: u64,
}

#[derive(Debug, Clone)]
pub struct IngestEncoder {
    cipher: ContentCipher,
    read_chunk_size: usize,
}

impl IngestEncoder {
    pub fn new(cipher: ContentCipher) -> Self {
        Self {
            cipher,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Encrypts everything `reader` yields into `destination`.
    ///
    /// On failure the partially written destination is removed before the
    /// error is returned, so no undecryptable file is left behind.
    pub async fn encode<R>(&self, reader: R, destination: &Path) -> Result<IngestReport, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        let (iv, transform) = self.cipher.new_encrypt_transform()?;

        match self.write_encrypted(reader, destination, iv, transform).await {
            Ok(report) => {
                tracing::info!(
                    destination = %destination.display(),
                    plaintext_len = report.plaintext_len,
                    encrypted_len = report.encrypted_len,
                    "content encrypted"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::error!(destination = %destination.display(), error = %err, "ingest failed");
                discard_partial(destination).await;
                Err(err)
            }
        }
    }

    /// Encrypts the file at `source` into `destination`.
    pub async fn encode_file(&self, source: &Path, destination: &Path) -> Result<IngestReport, IngestError> {
        let input = File::open(source).await?;
        self.encode(input, destination).await
    }

    async fn write_encrypted<R>(
        &self,
        mut reader: R,
        destination: &Path,
        iv: Iv,
        mut transform: EncryptTransform,
    ) -> Result<IngestReport, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        let mut output = File::create(destination).await?;
        write_header(&mut output, &iv).await?;

        let mut buf = vec![0u8; self.read_chunk_size];
        let mut plaintext_len = 0u64;
        let mut encrypted_len = IV_LEN as u64;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            plaintext_len += n as u64;
            let ciphertext = transform.update(&buf[..n]);
            output.write_all(&ciphertext).await?;
            encrypted_len += ciphertext.len() as u64;
        }

        let tail = transform.finalize()?;
        output.write_all(&tail).await?;
        encrypted_len += tail.len() as u64;

        output.flush().await?;
        output.sync_all().await?;

        Ok(IngestReport {
            plaintext_len,
            encrypted_len,
        })
    }
}

async fn discard_partial(destination: &Path) {
    match fs::remove_file(destination).await {
        Ok(()) => tracing::debug!(destination = %destination.display(), "removed partial output"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(
            destination = %destination.display(),
            error = %err,
            "failed to remove partial output"
        ),
    }
}
