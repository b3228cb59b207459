//! Encrypts a local file into the `[IV][ciphertext]` content format.
//!
//! Useful for seeding the content directory without going through the
//! upload endpoint. The key is read from `FOLIO_ENCRYPTION_SECRET`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use folio_content::config::SECRET_ENV;
use folio_content::domain::metadata::encrypted_file_name;
use folio_content::infrastructure::ingest::IngestEncoder;
use folio_content::{ContentCipher, SecretKey};

#[derive(Parser, Debug)]
#[command(name = "folio-encrypt")]
#[command(about = "Encrypt a file for the Folio content server")]
struct Args {
    /// Plaintext input file.
    input: PathBuf,

    /// Output path (defaults to `<input>.encrypted`).
    #[arg(short, long)]
    output: Option<PathBuf>,

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

    let key = SecretKey::from_env(SECRET_ENV).context("Failed to load encryption secret")?;
    let encoder = IngestEncoder::new(ContentCipher::new(key));

    let output = match args.output {
        Some(output) => output,
        None => {
            let Some(name) = args.input.file_name().and_then(|n| n.to_str()) else {
                bail!("Cannot derive output name from {:?}", args.input);
            };
            args.input.with_file_name(encrypted_file_name(name))
        }
    };

    let report = encoder
        .encode_file(&args.input, &output)
        .await
        .with_context(|| format!("Failed to encrypt {:?}", args.input))?;

    tracing::info!(
        "Encrypted {:?} -> {:?} ({} bytes plaintext, {} bytes written)",
        args.input,
        output,
        report.plaintext_len,
        report.encrypted_len
    );
    Ok(())
}
