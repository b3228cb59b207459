use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::{
    application_service::content_service::{
        discard_temp, sanitize_file_name, LocateError, RegisterUploadCommand, UploadError,
    },
    domain::content_id::ContentId,
};

use super::{AppState, DeliveryRequest, ErrorResponse};

#[derive(Deserialize)]
pub struct UploadContentParams {
    pub name: String,
}

#[derive(Serialize)]
pub struct UploadContentResponse {
    pub content_id: String,
    pub name: String,
    pub mime_type: String,
    pub original_size: u64,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contents", post(upload_content))
        .route("/contents/{id}", get(download_content))
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Stream the decrypted content (or the requested byte range).
///
/// Authorization is expected to have happened upstream.
async fn download_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let content_id = ContentId::new(id);

    let metadata = match state.delivery_service.locate(&content_id) {
        Ok(metadata) => metadata,
        Err(LocateError::NotFound) => {
            return api_error(StatusCode::NOT_FOUND, "Content file not found").into_response()
        }
        Err(e) => {
            tracing::error!(content_id = %content_id, error = %e, "catalog lookup failed");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response();
        }
    };

    // 非ASCIIなど解釈できない Range は不正な Range として 416 に落とす
    let range = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default());

    state
        .responder
        .respond(DeliveryRequest {
            encrypted_path: metadata.encrypted_path(),
            mime_type: metadata.mime_type(),
            original_size: Some(metadata.original_size()),
            range,
        })
        .await
}

/// Upload a new file as the raw request body and encrypt it.
async fn upload_content(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadContentParams>,
    body: Body,
) -> Result<(StatusCode, Json<UploadContentResponse>), ApiError> {
    sanitize_file_name(&params.name).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let temp_path = state
        .config
        .upload_dir
        .join(format!("{}.upload", uuid::Uuid::new_v4()));

    if let Err(err) = spool_body(body, &temp_path, state.config.max_upload_bytes).await {
        discard_temp(&temp_path).await;
        tracing::warn!(error = %err, "failed to receive upload");
        let status = match err {
            SpoolError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            SpoolError::Body(_) => StatusCode::BAD_REQUEST,
            SpoolError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        return Err(api_error(status, err.to_string()));
    }

    let result = state
        .upload_service
        .register(RegisterUploadCommand {
            temp_path,
            original_name: params.name,
        })
        .await
        .map_err(|e| match e {
            UploadError::Validation(msg) => api_error(StatusCode::BAD_REQUEST, msg),
            other => {
                tracing::error!(error = %other, "upload failed");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error encrypting file")
            }
        })?;

    let metadata = result.metadata;
    Ok((
        StatusCode::CREATED,
        Json(UploadContentResponse {
            content_id: metadata.id().as_str().to_string(),
            name: metadata.name().to_string(),
            mime_type: metadata.mime_type().to_string(),
            original_size: metadata.original_size(),
        }),
    ))
}

#[derive(Debug, thiserror::Error)]
enum SpoolError {
    #[error("upload exceeds {0} bytes")]
    TooLarge(u64),
    #[error("failed to read request body: {0}")]
    Body(axum::Error),
    #[error("failed to write temporary upload: {0}")]
    Io(#[from] std::io::Error),
}

async fn spool_body(body: Body, temp_path: &FsPath, limit: u64) -> Result<u64, SpoolError> {
    let mut file = File::create(temp_path).await?;
    let mut stream = body.into_data_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(SpoolError::Body)?;
        written += chunk.len() as u64;
        if written > limit {
            return Err(SpoolError::TooLarge(limit));
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(written)
}
