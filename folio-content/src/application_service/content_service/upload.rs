use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::domain::{
    content_id::ContentIdGenerator,
    metadata::{encrypted_file_name, ContentMetadata},
};
use crate::infrastructure::ingest::{IngestEncoder, IngestError};

use super::command::{RegisterUploadCommand, RegisterUploadResult};
use super::port::{CatalogError, ContentCatalog};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(std::io::Error),
    #[error("ingest error: {0}")]
    Ingest(IngestError),
    #[error("catalog error: {0}")]
    Catalog(CatalogError),
}

/// アップロード取り込みユースケースのアプリケーションサービス。
pub struct UploadService<G, R> {
    pub content_id_generator: G,
    pub catalog: R,
    pub encoder: IngestEncoder,
    pub content_dir: PathBuf,
}

impl<G, R> UploadService<G, R>
where
    G: ContentIdGenerator,
    R: ContentCatalog,
{
    /// 一時ファイルを暗号化して保存し、メタデータを登録する。
    ///
    /// 一時ファイルは結果に関わらず一度だけ削除する。
    pub async fn register(
        &self,
        cmd: RegisterUploadCommand,
    ) -> Result<RegisterUploadResult, UploadError> {
        let result = self.encrypt_and_record(&cmd).await;
        discard_temp(&cmd.temp_path).await;
        result
    }

    async fn encrypt_and_record(
        &self,
        cmd: &RegisterUploadCommand,
    ) -> Result<RegisterUploadResult, UploadError> {
        let name = sanitize_file_name(&cmd.original_name)?;
        let content_id = self.content_id_generator.generate();

        let content_dir = self.content_dir.join(content_id.as_str());
        fs::create_dir_all(&content_dir)
            .await
            .map_err(UploadError::Storage)?;
        let encrypted_path = content_dir.join(encrypted_file_name(&name));

        let report = match self.encoder.encode_file(&cmd.temp_path, &encrypted_path).await {
            Ok(report) => report,
            Err(err) => {
                discard_content_dir(&content_dir).await;
                return Err(UploadError::Ingest(err));
            }
        };

        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .to_string();
        let metadata = ContentMetadata::new(
            content_id,
            name,
            encrypted_path,
            mime_type,
            report.plaintext_len,
        );

        // メタデータが残らない暗号化ファイルは参照できないため削除する
        if let Err(err) = self.catalog.save(&metadata) {
            tracing::error!(content_id = %metadata.id(), error = %err, "failed to record metadata");
            discard_content_dir(&content_dir).await;
            return Err(UploadError::Catalog(err));
        }

        tracing::info!(
            content_id = %metadata.id(),
            name = metadata.name(),
            mime_type = metadata.mime_type(),
            original_size = metadata.original_size(),
            "content registered"
        );
        Ok(RegisterUploadResult { metadata })
    }
}

/// Keeps only the final path component of a client-supplied file name.
pub fn sanitize_file_name(raw: &str) -> Result<String, UploadError> {
    let name = Path::new(raw.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::trim)
        .unwrap_or_default();

    if name.is_empty() {
        return Err(UploadError::Validation("file name must not be empty".into()));
    }
    if name.chars().any(char::is_control) {
        return Err(UploadError::Validation(
            "file name must not contain control characters".into(),
        ));
    }
    Ok(name.to_string())
}

pub(crate) async fn discard_temp(temp_path: &Path) {
    match fs::remove_file(temp_path).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(
            temp_path = %temp_path.display(),
            error = %err,
            "failed to remove temporary upload"
        ),
    }
}

/// Removes the per-content directory along with anything written into it.
async fn discard_content_dir(content_dir: &Path) {
    match fs::remove_dir_all(content_dir).await {
        Ok(()) => tracing::debug!(content_dir = %content_dir.display(), "removed content directory"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(
            content_dir = %content_dir.display(),
            error = %err,
            "failed to remove content directory"
        ),
    }
}
