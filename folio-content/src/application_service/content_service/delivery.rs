use crate::domain::{content_id::ContentId, metadata::ContentMetadata};

use super::port::{CatalogError, ContentCatalog};

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("content not found")]
    NotFound,
    #[error("catalog error: {0}")]
    Catalog(CatalogError),
}

/// 配信ユースケース。
///
/// 認可は呼び出し側で完了している前提で、メタデータの解決だけを行う。
/// バイト列の復号・Range 処理は presentation 層のレスポンダが担う。
pub struct DeliveryService<R> {
    pub catalog: R,
}

impl<R> DeliveryService<R>
where
    R: ContentCatalog,
{
    pub fn locate(&self, content_id: &ContentId) -> Result<ContentMetadata, LocateError> {
        self.catalog
            .find_by_id(content_id)
            .map_err(LocateError::Catalog)?
            .ok_or(LocateError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::catalog::InMemoryContentCatalog;
    use std::path::PathBuf;

    #[test]
    fn test_locate() {
        let catalog = InMemoryContentCatalog::default();
        let id = ContentId::new("book-1".to_string());
        catalog
            .save(&ContentMetadata::new(
                id.clone(),
                "book.pdf".to_string(),
                PathBuf::from("content/book-1/book.pdf.encrypted"),
                "application/pdf".to_string(),
                10,
            ))
            .unwrap();
        let service = DeliveryService { catalog };

        assert_eq!(service.locate(&id).unwrap().name(), "book.pdf");
        assert!(matches!(
            service.locate(&ContentId::new("nope".to_string())),
            Err(LocateError::NotFound)
        ));
    }
}
