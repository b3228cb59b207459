use std::path::PathBuf;

use crate::domain::metadata::ContentMetadata;

/// アップロード取り込みユースケースの入力。
///
/// `temp_path` は外部のアップロード処理が保存した平文の一時ファイル。
/// 成功・失敗のどちらでもユースケース側で一度だけ削除される。
#[derive(Debug)]
pub struct RegisterUploadCommand {
    pub temp_path: PathBuf,
    pub original_name: String,
}

/// アップロード取り込みユースケースの出力。
#[derive(Debug)]
pub struct RegisterUploadResult {
    pub metadata: ContentMetadata,
}
