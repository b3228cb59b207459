//! Range-aware decrypting HTTP responder.
//!
//! Produces `200`, `206`, `416`, `404` or `500` for an encrypted file and
//! an optional `Range` header. The body is a lazy stream: hyper polls it
//! only when the connection can accept more data, and dropping it (client
//! disconnect) drops the decrypt session and its file handle.

use std::path::Path;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{future, stream, StreamExt};
use tokio::io::AsyncRead;

use crate::domain::byte_range::{unsatisfied_content_range, ByteRange, RangeSpec};
use crate::domain::metadata::download_name;
use crate::infrastructure::crypto::ContentCipher;
use crate::infrastructure::decrypt_session::{DecryptSession, Window};
use crate::infrastructure::encrypted_file::{DeliveryError, EncryptedFile};

use super::ErrorResponse;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Everything the responder needs to serve one request.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryRequest<'a> {
    pub encrypted_path: &'a Path,
    pub mime_type: &'a str,
    /// Declared plaintext size. Zero or absent means "measure the file".
    pub original_size: Option<u64>,
    pub range: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct RangeResponder {
    cipher: ContentCipher,
    read_chunk_size: usize,
}

impl RangeResponder {
    pub fn new(cipher: ContentCipher, read_chunk_size: usize) -> Self {
        Self {
            cipher,
            read_chunk_size,
        }
    }

    pub async fn respond(&self, request: DeliveryRequest<'_>) -> Response {
        match self.try_respond(request).await {
            Ok(response) => response,
            Err(DeliveryError::NotFound(path)) => {
                tracing::warn!(path = %path.display(), "encrypted file missing");
                error_response(StatusCode::NOT_FOUND, "File not found on server")
            }
            Err(err) => {
                tracing::error!(
                    path = %request.encrypted_path.display(),
                    error = %err,
                    "failed before response headers were sent"
                );
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error streaming file")
            }
        }
    }

    async fn try_respond(&self, request: DeliveryRequest<'_>) -> Result<Response, DeliveryError> {
        let mut file = EncryptedFile::open(request.encrypted_path).await?;

        let size = match request.original_size.filter(|size| *size > 0) {
            Some(size) => size,
            None => file.plaintext_len(&self.cipher).await?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(
            header::CONTENT_DISPOSITION,
            content_disposition(request.encrypted_path),
        );

        let (status, window) = match request.range {
            None => {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
                (StatusCode::OK, Window::leading(size))
            }
            Some(raw) => match RangeSpec::parse(raw).and_then(|spec| spec.resolve(size)) {
                Ok(range) => {
                    insert_range_headers(&mut headers, &range, size);
                    (StatusCode::PARTIAL_CONTENT, Window::from(range))
                }
                Err(err) => {
                    tracing::debug!(range = raw, size, error = %err, "range not satisfiable");
                    return Ok(range_not_satisfiable(headers, size));
                }
            },
        };
        headers.insert(header::CONTENT_TYPE, content_type(request.mime_type));

        let session = file.into_session(&self.cipher, window, self.read_chunk_size);
        let body = primed_body(session).await?;

        Ok((status, headers, body).into_response())
    }
}

/// Pulls the first chunk before headers are committed so that early
/// failures still become a 500, then streams the rest lazily.
async fn primed_body<R>(mut session: DecryptSession<R>) -> Result<Body, DeliveryError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let body = match session.next_chunk().await? {
        Some(first) => Body::from_stream(
            stream::once(future::ready(Ok::<_, DeliveryError>(first))).chain(session.into_stream()),
        ),
        None => Body::empty(),
    };
    Ok(body)
}

fn insert_range_headers(headers: &mut HeaderMap, range: &ByteRange, size: u64) {
    if let Ok(value) = HeaderValue::from_str(&range.content_range(size)) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len()));
}

fn range_not_satisfiable(mut headers: HeaderMap, size: u64) -> Response {
    if let Ok(value) = HeaderValue::from_str(&unsatisfied_content_range(size)) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    (StatusCode::RANGE_NOT_SATISFIABLE, headers, Body::empty()).into_response()
}

fn content_type(mime_type: &str) -> HeaderValue {
    HeaderValue::from_str(mime_type).unwrap_or(HeaderValue::from_static(FALLBACK_MIME_TYPE))
}

fn content_disposition(encrypted_path: &Path) -> HeaderValue {
    let name = download_name(encrypted_path).replace(['"', '\\'], "_");
    HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
        .unwrap_or(HeaderValue::from_static("attachment"))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
