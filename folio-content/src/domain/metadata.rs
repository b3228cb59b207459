use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::content_id::ContentId;

/// 暗号化済みファイルに付与する拡張子。
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// Returns the on-disk file name for an uploaded file name.
pub fn encrypted_file_name(original_name: &str) -> String {
    format!("{original_name}{ENCRYPTED_SUFFIX}")
}

/// 取り込み完了時に一度だけ生成され、以後は変更されないコンテンツのメタデータ。
///
/// - `original_size` は平文のバイト数。Range の境界計算に用いる。
/// - `encrypted_path` は `[IV][ciphertext]` 形式のファイルを指す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentMetadata {
    id: ContentId,
    name: String,
    encrypted_path: PathBuf,
    mime_type: String,
    original_size: u64,
    created_at: DateTime<Utc>,
}

impl ContentMetadata {
    pub fn new(
        id: ContentId,
        name: String,
        encrypted_path: PathBuf,
        mime_type: String,
        original_size: u64,
    ) -> Self {
        Self {
            id,
            name,
            encrypted_path,
            mime_type,
            original_size,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encrypted_path(&self) -> &Path {
        &self.encrypted_path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// ダウンロード時のファイル名。保存パスから暗号化拡張子を取り除いたもの。
    pub fn download_name(&self) -> String {
        download_name(&self.encrypted_path)
    }
}

/// Strips the encryption suffix from the stored file name.
pub fn download_name(encrypted_path: &Path) -> String {
    let file_name = encrypted_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(ENCRYPTED_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => file_name,
    }
}
