//! On-disk framing: `[16-byte IV][AES-256-CBC ciphertext]`.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::infrastructure::crypto::{CodecError, ContentCipher, Iv, BLOCK_LEN, IV_LEN};
use crate::infrastructure::decrypt_session::{DecryptSession, Window};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("encrypted file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("corrupt encrypted file: {0}")]
    CorruptFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodecError> for DeliveryError {
    fn from(err: CodecError) -> Self {
        DeliveryError::CorruptFile(err.to_string())
    }
}

/// Writes the plaintext IV frame that prefixes every encrypted file.
pub async fn write_header<W>(writer: &mut W, iv: &Iv) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(iv.as_bytes()).await
}

/// An encrypted file whose IV frame has been read and whose reader is
/// positioned at the first ciphertext byte.
pub struct EncryptedFile<R> {
    reader: R,
    iv: Iv,
    ciphertext_len: Option<u64>,
}

impl EncryptedFile<File> {
    pub async fn open(path: &Path) -> Result<Self, DeliveryError> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(DeliveryError::NotFound(path.to_path_buf()))
            }
            Err(err) => return Err(err.into()),
        };
        let disk_len = file.metadata().await?.len();
        Self::from_reader(file, Some(disk_len)).await
    }
}

impl<R> EncryptedFile<R>
where
    R: AsyncRead + Unpin,
{
    /// `total_len` is the framed length (IV included) when known.
    pub async fn from_reader(mut reader: R, total_len: Option<u64>) -> Result<Self, DeliveryError> {
        let mut iv = [0u8; IV_LEN];
        match reader.read_exact(&mut iv).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Err(DeliveryError::CorruptFile(
                    "file is shorter than the IV frame".to_string(),
                ))
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Self {
            reader,
            iv: Iv::from_bytes(iv),
            ciphertext_len: total_len.map(|len| len.saturating_sub(IV_LEN as u64)),
        })
    }

    pub fn iv(&self) -> &Iv {
        &self.iv
    }

    /// Length of the ciphertext body, i.e. the file length minus the IV.
    pub fn ciphertext_len(&self) -> Option<u64> {
        self.ciphertext_len
    }

    pub fn into_session(
        self,
        cipher: &ContentCipher,
        window: Window,
        read_chunk_size: usize,
    ) -> DecryptSession<R> {
        let transform = cipher.new_decrypt_transform(&self.iv);
        DecryptSession::new(self.reader, transform, window, read_chunk_size)
    }
}

impl<R> EncryptedFile<R>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    /// Exact plaintext length, recovered from the final ciphertext block.
    ///
    /// In CBC the last block decrypts with the previous ciphertext block (or
    /// the IV for a single-block file) as chaining value, so only the tail is
    /// read. The reader is left at the first ciphertext byte.
    pub async fn plaintext_len(&mut self, cipher: &ContentCipher) -> Result<u64, DeliveryError> {
        let Some(ciphertext_len) = self.ciphertext_len else {
            return Err(DeliveryError::CorruptFile(
                "ciphertext length is unknown".to_string(),
            ));
        };
        let block = BLOCK_LEN as u64;
        if ciphertext_len == 0 || ciphertext_len % block != 0 {
            return Err(CodecError::Corrupt("ciphertext is not block aligned").into());
        }

        let header = IV_LEN as u64;
        let chaining = if ciphertext_len == block {
            *self.iv.as_bytes()
        } else {
            let mut previous = [0u8; BLOCK_LEN];
            self.reader
                .seek(SeekFrom::Start(header + ciphertext_len - 2 * block))
                .await?;
            self.reader.read_exact(&mut previous).await?;
            previous
        };

        let mut last = [0u8; BLOCK_LEN];
        self.reader
            .seek(SeekFrom::Start(header + ciphertext_len - block))
            .await?;
        self.reader.read_exact(&mut last).await?;
        self.reader.seek(SeekFrom::Start(header)).await?;

        let mut transform = cipher.new_decrypt_transform(&Iv::from_bytes(chaining));
        let head = transform.update(&last);
        let tail = transform.finalize()?;
        Ok(ciphertext_len - block + (head.len() + tail.len()) as u64)
    }
}
