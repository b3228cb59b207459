use std::fmt;

/// Content を一意に識別するための ID。
///
/// 生成ロジック（UUID 等）は infra 側で実装し、ドメイン側では
/// 「ContentId という概念」と最小限の操作だけを提供する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ContentId を生成するためのポート。
pub trait ContentIdGenerator {
    fn generate(&self) -> ContentId;
}
