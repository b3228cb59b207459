//! Content server binary entry point.
//!
//! Serves encrypted content with HTTP range support and accepts raw uploads
//! that are encrypted on ingest.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use folio_content::config::{ContentServerConfig, DEFAULT_READ_CHUNK_SIZE, SECRET_ENV};
use folio_content::infrastructure::catalog::InMemoryContentCatalog;
use folio_content::presentation::{self, AppState};
use folio_content::{ContentCipher, SecretKey};

/// Content server CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "folio-content")]
#[command(about = "Folio content server - encrypted content ingest and delivery")]
struct Args {
    /// HTTP listen address.
    #[arg(short, long, env = "FOLIO_LISTEN", default_value = "127.0.0.1:4001")]
    listen: SocketAddr,

    /// Directory that holds encrypted content.
    #[arg(long, env = "FOLIO_CONTENT_DIR", default_value = "content")]
    content_dir: PathBuf,

    /// Directory used to spool uploads before encryption.
    #[arg(long, env = "FOLIO_UPLOAD_DIR", default_value = "temp_uploads")]
    upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes.
    #[arg(long, env = "FOLIO_MAX_UPLOAD_BYTES", default_value_t = 2 * 1024 * 1024 * 1024u64)]
    max_upload_bytes: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    // 鍵が無い状態でリクエストを受け付けないよう、起動時に検証する
    let key = SecretKey::from_env(SECRET_ENV).context("Failed to load encryption secret")?;
    let cipher = ContentCipher::new(key);

    let config = ContentServerConfig {
        content_dir: args.content_dir,
        upload_dir: args.upload_dir,
        max_upload_bytes: args.max_upload_bytes,
        read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
    };
    config
        .prepare_dirs()
        .context("Failed to prepare storage directories")?;

    tracing::info!("Starting Folio content server");
    tracing::info!("Content directory: {:?}", config.content_dir);
    tracing::info!("Upload directory: {:?}", config.upload_dir);

    let state = Arc::new(AppState::new(
        cipher,
        InMemoryContentCatalog::default(),
        config,
    ));
    let app = presentation::create_router(state);

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    tracing::info!("HTTP listening on http://{}", args.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
