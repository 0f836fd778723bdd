use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, warn};

const KAGGLE_DOWNLOAD_BASE: &str = "https://www.kaggle.com/api/v1/datasets/download";
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

impl KaggleCredentials {
    /// `KAGGLE_USERNAME`/`KAGGLE_KEY`, else `~/.kaggle/kaggle.json`.
    pub fn resolve() -> Result<Self> {
        let username = std::env::var("KAGGLE_USERNAME").ok();
        let key = std::env::var("KAGGLE_KEY").ok();
        if let (Some(username), Some(key)) = (username, key) {
            if !username.trim().is_empty() && !key.trim().is_empty() {
                return Ok(Self { username, key });
            }
        }
        let path = default_credentials_path()
            .ok_or_else(|| anyhow!("no Kaggle credentials: set KAGGLE_USERNAME/KAGGLE_KEY"))?;
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read kaggle credentials {}", path.display()))?;
        serde_json::from_str(&raw).context("invalid kaggle.json")
    }
}

fn default_credentials_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("KAGGLE_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir).join("kaggle.json"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".kaggle").join("kaggle.json"))
}

#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

pub fn download_url(dataset: &str, file_name: &str) -> Result<Url> {
    let (owner, slug) = dataset
        .split_once('/')
        .filter(|(owner, slug)| !owner.is_empty() && !slug.is_empty() && !slug.contains('/'))
        .ok_or_else(|| anyhow!("dataset must look like owner/slug, got {dataset:?}"))?;
    let mut url = Url::parse(KAGGLE_DOWNLOAD_BASE).context("invalid kaggle base url")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("kaggle base url cannot take a path"))?
        .extend([owner, slug, file_name]);
    Ok(url)
}

/// Download the current version of `file_name` from `dataset` into `dest_dir`,
/// replacing any earlier copy. Zipped payloads are unpacked.
pub fn fetch_dataset_file(
    client: &Client,
    credentials: &KaggleCredentials,
    dataset: &str,
    file_name: &str,
    dest_dir: &Path,
) -> Result<DownloadedFile> {
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("create download dir {}", dest_dir.display()))?;
    let url = download_url(dataset, file_name)?;
    let target = dest_dir.join(file_name);
    let download = target.with_extension("download");

    info!(%url, "downloading dataset file");
    let mut resp = client
        .get(url.as_str())
        .basic_auth(&credentials.username, Some(&credentials.key))
        .send()
        .context("kaggle download request failed")?
        .error_for_status()
        .context("kaggle download rejected")?;
    {
        let mut out = File::create(&download)
            .with_context(|| format!("create {}", download.display()))?;
        resp.copy_to(&mut out).context("write kaggle download")?;
    }

    if is_zip(&download)? {
        unpack_entry(&download, file_name, &target)?;
        if let Err(err) = fs::remove_file(&download) {
            warn!(path = %download.display(), error = %err, "failed to remove downloaded archive");
        }
    } else {
        fs::rename(&download, &target)
            .with_context(|| format!("move download to {}", target.display()))?;
    }

    let bytes = fs::metadata(&target)
        .with_context(|| format!("stat {}", target.display()))?
        .len();
    Ok(DownloadedFile {
        path: target,
        bytes,
    })
}

fn is_zip(path: &Path) -> Result<bool> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(&magic == ZIP_MAGIC),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(err).context("read download header"),
    }
}

/// Extract the archive member named `file_name` (any directory) to `target`.
pub fn unpack_entry(archive_path: &Path, file_name: &str, target: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("open archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("read zip archive")?;

    let mut found = None;
    for idx in 0..archive.len() {
        let entry = archive.by_index(idx).context("read zip entry")?;
        if entry.name().rsplit('/').next() == Some(file_name) {
            found = Some(idx);
            break;
        }
    }
    let idx = match found {
        Some(idx) => idx,
        None if archive.len() == 1 => 0,
        None => return Err(anyhow!("{file_name} not found in downloaded archive")),
    };

    let partial = target.with_extension("part");
    {
        let mut entry = archive.by_index(idx).context("read zip entry")?;
        let mut out =
            File::create(&partial).with_context(|| format!("create {}", partial.display()))?;
        io::copy(&mut entry, &mut out).context("unpack zip entry")?;
    }
    fs::rename(&partial, target).with_context(|| format!("move to {}", target.display()))?;
    Ok(())
}
