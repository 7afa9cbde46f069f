//! Data refresh: download the open-data archive and extract it into the data directory.

use reqwest::Client;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::info;
use zip::ZipArchive;

use crate::error::RefreshError;

/// File name the archive is saved under inside the data directory
pub const ARCHIVE_NAME: &str = "lvr_landcsv.zip";

/// Outcome of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub archive: PathBuf,
    pub bytes: u64,
    pub entries: usize,
}

/// HTTP client for archive downloads.
///
/// `timeout` bounds connecting and every individual read, so a stalled body
/// fails instead of waiting forever; a slow but progressing download is fine.
pub fn download_client(timeout: Duration) -> Result<Client, RefreshError> {
    Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(RefreshError::Client)
}

/// Download `url` into `data_dir` and extract every entry next to it.
///
/// `on_progress` receives (bytes so far, content length if known) after each chunk.
pub async fn refresh_dataset<F>(
    client: &Client,
    url: &str,
    data_dir: &Path,
    mut on_progress: F,
) -> Result<RefreshSummary, RefreshError>
where
    F: FnMut(u64, Option<u64>),
{
    if !data_dir.exists() {
        info!("Creating data directory {}", data_dir.display());
        fs::create_dir_all(data_dir)?;
    }

    let download = |source| RefreshError::Download {
        url: url.to_string(),
        source,
    };

    info!("Downloading {}", url);
    let mut response = client.get(url).send().await.map_err(download)?;
    if !response.status().is_success() {
        return Err(RefreshError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length();
    let mut staged = NamedTempFile::new_in(data_dir)?;
    let mut bytes = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(download)? {
        staged.write_all(&chunk)?;
        bytes += chunk.len() as u64;
        on_progress(bytes, total);
    }
    staged.flush()?;

    let archive = data_dir.join(ARCHIVE_NAME);
    staged.persist(&archive).map_err(|e| e.error)?;
    info!("Downloaded {} bytes to {}", bytes, archive.display());

    let entries = extract_archive(&archive, data_dir)?;
    info!("Extracted {} entries into {}", entries, data_dir.display());

    Ok(RefreshSummary {
        archive,
        bytes,
        entries,
    })
}

/// Extract all entries of a zip archive into `dest`
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, RefreshError> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    let entries = zip.len();
    zip.extract(dest)?;
    Ok(entries)
}
