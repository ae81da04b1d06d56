//! Streaming HTTP download of raw CSV exports.
//!
//! The response body is streamed to disk in chunks so multi-gigabyte
//! exports never sit in memory.

use std::path::Path;

use futures::StreamExt as _;
use tokio::io::{AsyncWriteExt as _, BufWriter};

use crate::SourceError;
use crate::progress::ProgressCallback;

/// Write buffer size for downloads (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("collision-prep/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the client cannot be built.
pub fn build_client() -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Downloads `url` to `dest`, returning the number of bytes written.
///
/// Creates the parent directory if needed. The progress total is set
/// from `Content-Length` when the server provides one.
///
/// # Errors
///
/// Returns [`SourceError::HttpStatus`] for non-success responses,
/// [`SourceError::Http`] if the request or body stream fails, and
/// [`SourceError::Io`] if the file cannot be written.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: &dyn ProgressCallback,
) -> Result<u64, SourceError> {
    log::info!("Downloading {url}");
    log::debug!("  -> {}", dest.display());

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SourceError::io(parent, e))?;
    }

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    if let Some(size) = response.content_length() {
        progress.set_total(size);
        #[allow(clippy::cast_precision_loss)]
        let mb = size as f64 / 1_048_576.0;
        log::debug!("  file size: {mb:.1} MB");
    }

    let file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| SourceError::io(dest, e))?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| SourceError::io(dest, e))?;
        downloaded += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }

    writer.flush().await.map_err(|e| SourceError::io(dest, e))?;

    #[allow(clippy::cast_precision_loss)]
    let mb = downloaded as f64 / 1_048_576.0;
    log::debug!("  download complete: {mb:.1} MB");

    Ok(downloaded)
}
