use std::sync::Arc;

use axum::{routing::get, Router};
use serde::Serialize;

use crate::application_service::content_service::{DeliveryService, UploadService};
use crate::config::ContentServerConfig;
use crate::infrastructure::{
    catalog::InMemoryContentCatalog, content_id::UuidContentIdGenerator, crypto::ContentCipher,
    ingest::IngestEncoder,
};

pub mod content;
pub mod responder;

pub use responder::{DeliveryRequest, RangeResponder};

pub type ContentUploadService = UploadService<UuidContentIdGenerator, InMemoryContentCatalog>;
pub type ContentDeliveryService = DeliveryService<InMemoryContentCatalog>;

/// Application state shared across handlers.
pub struct AppState {
    pub upload_service: ContentUploadService,
    pub delivery_service: ContentDeliveryService,
    pub responder: RangeResponder,
    pub config: ContentServerConfig,
}

impl AppState {
    pub fn new(
        cipher: ContentCipher,
        catalog: InMemoryContentCatalog,
        config: ContentServerConfig,
    ) -> Self {
        let encoder =
            IngestEncoder::new(cipher.clone()).with_read_chunk_size(config.read_chunk_size);
        Self {
            upload_service: UploadService {
                content_id_generator: UuidContentIdGenerator,
                catalog: catalog.clone(),
                encoder,
                content_dir: config.content_dir.clone(),
            },
            delivery_service: DeliveryService { catalog },
            responder: RangeResponder::new(cipher, config.read_chunk_size),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

async fn health() -> &'static str {
    "ok"
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(content::routes())
        .with_state(state)
}
