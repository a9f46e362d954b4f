use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use common::config::{ConfigurationSource, LayeredConfigSource};
use tracing::info;
use uploader::{UploadKeyResolver, UploadRequest, public_url};

/// Upload a file to Cloudflare R2 using the host upload layout.
#[derive(Debug, Parser)]
#[command(name = "r2-upload", version)]
struct Cli {
    /// File to upload.
    file: PathBuf,

    /// Name to record for the upload. Defaults to the file's own name.
    #[arg(long)]
    name: Option<String>,

    /// Configuration file; the extension may be omitted.
    #[arg(long, env = "R2UPLOAD_CONFIG", default_value = "config/uploader")]
    config: String,

    /// Keep the source file instead of moving it into the local mirror.
    #[arg(long)]
    keep: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    let source = Arc::new(LayeredConfigSource::new(&cli.config));
    let config = source.load().context("Failed to load config")?;

    let name = match cli.name {
        Some(name) => name,
        None => cli
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("File path has no file name")?,
    };

    let metadata = tokio::fs::metadata(&cli.file)
        .await
        .with_context(|| format!("Failed to stat {}", cli.file.display()))?;

    let request = if cli.keep {
        let data = tokio::fs::read(&cli.file)
            .await
            .with_context(|| format!("Failed to read {}", cli.file.display()))?;
        UploadRequest::from_bytes(name, data)
    } else {
        UploadRequest::from_file(name, cli.file.clone(), metadata.len())
    };

    let resolver = UploadKeyResolver::r2(source);
    let result = resolver.upload(request).await.context("Upload failed")?;

    info!(key = %result.path, "Upload complete");
    println!("{}", serde_json::to_string_pretty(&result)?);
    println!("{}", public_url(&config.r2.access_domain, &result.path));

    Ok(())
}
