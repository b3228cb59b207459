use crate::domain::{content_id::ContentId, metadata::ContentMetadata};

/// コンテンツのメタデータを保存・取得するポート。
///
/// 本番の永続化は外部コンポーネントが担い、ここでは最小限の操作だけを定義する。
pub trait ContentCatalog {
    fn save(&self, metadata: &ContentMetadata) -> Result<(), CatalogError>;

    fn find_by_id(&self, content_id: &ContentId) -> Result<Option<ContentMetadata>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("storage error: {0}")]
    Storage(String),
}
