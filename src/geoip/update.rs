//! Geolocation database refresh.
//!
//! Downloads a range CSV to a temporary file in the destination directory
//! and atomically renames it into place, so a concurrent load never sees a
//! partially-written database file.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Downloads one range database and atomically replaces `dest`.
///
/// Gzip-compressed remote sources (URL ending in `.gz`) are decompressed
/// before the swap. On any failure the previous on-disk file is left
/// untouched.
pub(crate) async fn download_database(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<()> {
    log::info!("Downloading IP database from {url} to {}", dest.display());

    let dest_dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("failed to create database directory {}", dest_dir.display()))?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    if !response.status().is_success() {
        anyhow::bail!("download of {url} failed: HTTP {}", response.status());
    }
    let body = response
        .bytes()
        .await
        .with_context(|| format!("failed to read response body from {url}"))?;

    let data = maybe_decompress(url, &body)?;

    // Temp file in the destination directory so the rename stays on one
    // filesystem and is atomic.
    let mut tmp = tempfile::NamedTempFile::new_in(dest_dir)
        .with_context(|| format!("failed to create temp file in {}", dest_dir.display()))?;
    tmp.write_all(&data).context("failed to write temp file")?;
    tmp.flush().context("failed to flush temp file")?;
    tmp.persist(dest)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", dest.display()))?;

    log::info!(
        "Download complete for {url} ({} bytes written to {})",
        data.len(),
        dest.display()
    );
    Ok(())
}

/// Decompresses the payload when the URL names a gzip member,
/// otherwise passes it through.
fn maybe_decompress(url: &str, body: &[u8]) -> Result<Vec<u8>> {
    if !url.ends_with(".gz") {
        return Ok(body.to_vec());
    }
    let mut decoder = flate2::read::GzDecoder::new(body);
    let mut data = Vec::new();
    decoder
        .read_to_end(&mut data)
        .with_context(|| format!("failed to decompress gzip payload from {url}"))?;
    Ok(data)
}
