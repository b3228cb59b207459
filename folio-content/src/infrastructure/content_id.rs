use crate::domain::content_id::{ContentId, ContentIdGenerator};

/// UUID v4 ベースの ContentIdGenerator 実装。
/// アップロードはストリームで取り込むため、内容ハッシュではなくランダム ID を用いる。
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidContentIdGenerator;

impl ContentIdGenerator for UuidContentIdGenerator {
    fn generate(&self) -> ContentId {
        ContentId::new(uuid::Uuid::new_v4().to_string())
    }
}
