use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// File name the license text is saved under.
pub const LICENSE_FILE: &str = "COPYING.txt";

/// Download `url` to `dest`, retrying transient failures.
#[tracing::instrument(skip(runtime, dest, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading {} to {:?}...", url, dest);

    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create {:?}", dest))
        })
        .await?;

    info!("Downloaded {} bytes.", bytes);
    Ok(bytes)
}

/// Fetch the project license into `dir`.
///
/// The installer template expects the file beside the generated scripts.
pub async fn fetch_license<R: Runtime>(
    runtime: &R,
    url: &str,
    dir: &Path,
    http_client: &HttpClient,
) -> Result<PathBuf> {
    let dest = dir.join(LICENSE_FILE);
    download_file(runtime, url, &dest, http_client)
        .await
        .with_context(|| format!("Failed to fetch license from {}", url))?;
    Ok(dest)
}
