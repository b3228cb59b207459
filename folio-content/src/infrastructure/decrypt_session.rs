//! Sequential decrypt-and-window pipeline for a single delivery.
//!
//! CBC cannot start mid-stream, so the ciphertext is always decrypted from
//! the first block. Plaintext before the window is discarded, plaintext
//! inside it is emitted, and the session tears itself down as soon as the
//! window has been delivered.

use bytes::Bytes;
use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::domain::ByteRange;
use crate::infrastructure::crypto::DecryptTransform;
use crate::infrastructure::encrypted_file::DeliveryError;

/// Plaintext window to emit: skip `skip` bytes, then emit at most `take`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    skip: u64,
    take: Option<u64>,
}

impl Window {
    /// Everything up to the end of the plaintext.
    pub fn unbounded() -> Self {
        Self {
            skip: 0,
            take: None,
        }
    }

    /// The first `len` plaintext bytes.
    pub fn leading(len: u64) -> Self {
        Self {
            skip: 0,
            take: Some(len),
        }
    }
}

impl From<ByteRange> for Window {
    fn from(range: ByteRange) -> Self {
        Self {
            skip: range.start(),
            take: Some(range.len()),
        }
    }
}

struct Pipeline<R> {
    reader: R,
    transform: DecryptTransform,
}

/// Per-request decrypt state: file handle, decrypt transform and position
/// counters. Dropping the session releases the handle.
pub struct DecryptSession<R> {
    pipeline: Option<Pipeline<R>>,
    buf: Vec<u8>,
    window: Window,
    /// Plaintext bytes produced by the transform so far.
    processed: u64,
    /// Plaintext bytes handed to the consumer so far.
    sent: u64,
}

impl<R> DecryptSession<R>
where
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(
        reader: R,
        transform: DecryptTransform,
        window: Window,
        read_chunk_size: usize,
    ) -> Self {
        Self {
            pipeline: Some(Pipeline { reader, transform }),
            buf: vec![0u8; read_chunk_size.max(1)],
            window,
            processed: 0,
            sent: 0,
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// True once the file handle and transform have been released.
    pub fn is_closed(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Pulls ciphertext until a non-empty windowed plaintext chunk is ready.
    ///
    /// Returns `Ok(None)` once the window is satisfied or the plaintext is
    /// exhausted; the session is closed at that point.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, DeliveryError> {
        loop {
            if self.remaining() == Some(0) {
                self.close();
                return Ok(None);
            }
            let Some(pipeline) = self.pipeline.as_mut() else {
                return Ok(None);
            };

            let plaintext = match pipeline.reader.read(&mut self.buf).await {
                Ok(0) => self.finish()?,
                Ok(n) => pipeline.transform.update(&self.buf[..n]),
                Err(err) => {
                    tracing::error!(error = %err, sent = self.sent, "read failed while decrypting");
                    self.close();
                    return Err(err.into());
                }
            };

            let chunk = self.apply_window(&plaintext);
            if !chunk.is_empty() {
                if self.remaining() == Some(0) {
                    self.close();
                }
                return Ok(Some(chunk));
            }
        }
    }

    /// Releases the file handle and transform without waiting for EOF.
    pub fn close(&mut self) {
        if self.pipeline.take().is_some() {
            tracing::debug!(
                processed = self.processed,
                sent = self.sent,
                "decrypt session closed"
            );
        }
    }

    /// Lazily yields the windowed plaintext. Each chunk is read and
    /// decrypted only when the consumer polls for it.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, DeliveryError>> + Send + 'static
    where
        R: Send + 'static,
    {
        futures::stream::try_unfold(self, |mut session| async move {
            Ok(session.next_chunk().await?.map(|chunk| (chunk, session)))
        })
    }

    fn remaining(&self) -> Option<u64> {
        self.window.take.map(|take| take - self.sent)
    }

    fn finish(&mut self) -> Result<Vec<u8>, DeliveryError> {
        let Some(Pipeline { transform, .. }) = self.pipeline.take() else {
            return Ok(Vec::new());
        };
        transform.finalize().map_err(|err| {
            tracing::error!(error = %err, sent = self.sent, "final block rejected");
            DeliveryError::from(err)
        })
    }

    fn apply_window(&mut self, plaintext: &[u8]) -> Bytes {
        let chunk_len = plaintext.len() as u64;
        let chunk_offset = self.processed;
        self.processed += chunk_len;

        let from = self.window.skip.saturating_sub(chunk_offset).min(chunk_len);
        let to = match self.remaining() {
            Some(remaining) => chunk_len.min(from.saturating_add(remaining)),
            None => chunk_len,
        };
        if to <= from {
            return Bytes::new();
        }

        self.sent += to - from;
        Bytes::copy_from_slice(&plaintext[from as usize..to as usize])
    }
}

impl<R> Drop for DecryptSession<R> {
    fn drop(&mut self) {
        if self.pipeline.is_some() {
            tracing::debug!(
                processed = self.processed,
                sent = self.sent,
                "decrypt session dropped before completion"
            );
        }
    }
}
