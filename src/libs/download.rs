//! Streaming asset download with progress reporting.
//!
//! The response body is consumed chunk by chunk and each chunk is written to
//! disk as soon as it arrives, so memory use does not depend on asset size.
//! After every chunk the caller receives a [`DownloadProgress`]. Waiting for
//! the response and for each chunk races the cancellation token, so a stalled
//! server does not hold up cancellation.

use super::config::UpdaterConfig;
use super::context::AppContext;
use super::data_storage::DataStorage;
use super::error::UpdateError;
use futures_util::{Stream, StreamExt};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Sub-directory of the data directory where assets are downloaded before install.
pub const STAGING_DIR: &str = "downloads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Content-Length of the asset, 0 when the server did not send one.
    pub total: u64,
    pub downloaded: u64,
    pub percentage: u8,
}

impl DownloadProgress {
    pub fn new(total: u64, downloaded: u64) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (downloaded.saturating_mul(100) / total).min(100) as u8
        };
        Self {
            total,
            downloaded,
            percentage,
        }
    }
}

/// Drains `stream` into `writer`, reporting progress after every chunk.
///
/// Returns the number of bytes written.
pub async fn write_chunks<S, B, W, F>(
    mut stream: S,
    total: u64,
    writer: &mut W,
    path: &Path,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<u64, UpdateError>
where
    S: Stream<Item = Result<B, UpdateError>> + Unpin,
    B: AsRef<[u8]>,
    W: AsyncWrite + Unpin,
    F: FnMut(DownloadProgress),
{
    let mut downloaded: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(downloaded, "download cancelled");
                return Err(UpdateError::Cancelled);
            }
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        writer.write_all(bytes).await.map_err(|source| UpdateError::DownloadIo {
            path: path.to_path_buf(),
            source,
        })?;
        downloaded += bytes.len() as u64;
        on_progress(DownloadProgress::new(total, downloaded));
    }

    writer.flush().await.map_err(|source| UpdateError::DownloadIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(downloaded)
}

/// Where an asset called `asset_name` is downloaded to before installation.
pub fn staging_path(asset_name: &str) -> Result<PathBuf, UpdateError> {
    staging_path_in(&DataStorage::new().base_path().join(STAGING_DIR), asset_name)
}

/// Path for `asset_name` inside `dir`, creating `dir` if needed.
///
/// Only the final path component of the name is used.
pub fn staging_path_in(dir: &Path, asset_name: &str) -> Result<PathBuf, UpdateError> {
    std::fs::create_dir_all(dir).map_err(|source| UpdateError::DownloadIo {
        path: dir.to_path_buf(),
        source,
    })?;
    let file_name = Path::new(asset_name).file_name().map(|name| name.to_os_string()).unwrap_or_else(|| "update.bin".into());
    Ok(dir.join(file_name))
}

#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    user_agent: String,
}

impl Downloader {
    pub fn new(config: &UpdaterConfig, ctx: &AppContext) -> Result<Self, UpdateError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build().map_err(UpdateError::Download)?,
            user_agent: ctx.user_agent(),
        })
    }

    /// Streams `url` into `dest` and returns `dest` once the body is complete.
    ///
    /// A failed download leaves whatever was written so far in place.
    pub async fn download<F>(&self, url: &str, dest: &Path, cancel: &CancellationToken, on_progress: F) -> Result<PathBuf, UpdateError>
    where
        F: FnMut(DownloadProgress),
    {
        tracing::info!(url, dest = %dest.display(), "starting download");
        let request = self.client.get(url).header(USER_AGENT, &self.user_agent).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(url, "download cancelled before the response arrived");
                return Err(UpdateError::Cancelled);
            }
            response = request => response.map_err(UpdateError::Download)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::DownloadStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        tracing::debug!(total, "content length");

        if let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| UpdateError::DownloadIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut file = File::create(dest).await.map_err(|source| UpdateError::DownloadIo {
            path: dest.to_path_buf(),
            source,
        })?;

        let stream = response.bytes_stream().map(|chunk| chunk.map_err(UpdateError::Download));
        let written = write_chunks(stream, total, &mut file, dest, cancel, on_progress).await?;

        tracing::info!(bytes = written, dest = %dest.display(), "download complete");
        Ok(dest.to_path_buf())
    }
}
