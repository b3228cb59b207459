use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::application_service::content_service::{CatalogError, ContentCatalog};
use crate::domain::{content_id::ContentId, metadata::ContentMetadata};

/// インメモリの ContentCatalog 実装。
/// プロセス内の HashMap に保存するだけで、永続化は行わない。
#[derive(Clone, Default)]
pub struct InMemoryContentCatalog {
    inner: Arc<Mutex<HashMap<String, ContentMetadata>>>,
}

impl ContentCatalog for InMemoryContentCatalog {
    fn save(&self, metadata: &ContentMetadata) -> Result<(), CatalogError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;

        guard.insert(metadata.id().as_str().to_string(), metadata.clone());
        Ok(())
    }

    fn find_by_id(&self, content_id: &ContentId) -> Result<Option<ContentMetadata>, CatalogError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| CatalogError::Storage(e.to_string()))?;

        Ok(guard.get(content_id.as_str()).cloned())
    }
}
