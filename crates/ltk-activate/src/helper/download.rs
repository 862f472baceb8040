//! Skin bundle downloads from the skin repository.
//!
//! Bundles are published as `{base}/{champion}/{skin}/{skin}.zip`, variants as
//! `{base}/{champion}/{skin}/{variant}/{variant}.zip`. Some are only available
//! as `.fantome`, which is the same zip layout under another extension.

use super::layout::is_extracted_mod;
use camino::{Utf8Path, Utf8PathBuf};
use ltk_activation::{HelperError, HelperResult, SkinDownloadRequest};
use reqwest::StatusCode;
use std::fs::{self, File};
use std::io;
use std::time::Duration;
use zip::ZipArchive;

const ATTEMPTS_PER_URL: usize = 2;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const ARCHIVE_EXTENSIONS: [&str; 2] = ["zip", "fantome"];

/// Error string reported when no URL produced a usable bundle.
pub const SKIN_NOT_FOUND: &str = "SKIN_NOT_FOUND";

/// Entries containing any of these are locale voice packs or TFT assets and
/// crash a regular game client when overlaid.
const SKIPPED_ENTRY_PATTERNS: [&str; 34] = [
    ".tr_TR.", ".en_US.", ".en_GB.", ".de_DE.", ".es_ES.", ".es_MX.", ".fr_FR.", ".it_IT.",
    ".pl_PL.", ".pt_BR.", ".ro_RO.", ".ru_RU.", ".el_GR.", ".cs_CZ.", ".hu_HU.", ".ja_JP.",
    ".ko_KR.", ".zh_CN.", ".zh_TW.", ".th_TH.", ".vi_VN.", ".ar_AE.", ".id_ID.", ".ms_MY.",
    ".ph_PH.", ".sg_SG.", ".tw_TW.", "TFT", "tft", "Teamfight", "teamfight", "Map22", "Map30",
    "Map33",
];

pub struct SkinRepository {
    client: reqwest::Client,
    base_url: String,
    mods_dir: Utf8PathBuf,
}

impl SkinRepository {
    pub fn new(base_url: impl Into<String>, mods_dir: Utf8PathBuf) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mods_dir,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Candidate URLs for `request`, `.zip` first.
    pub fn urls(&self, request: &SkinDownloadRequest) -> Vec<String> {
        let folder = match request.variant_id() {
            Some(variant) => format!(
                "{}/{}/{}/{}/{}",
                self.base_url, request.champion_id, request.skin_id, variant, variant
            ),
            None => format!(
                "{}/{}/{}/{}",
                self.base_url, request.champion_id, request.skin_id, request.skin_id
            ),
        };
        ARCHIVE_EXTENSIONS
            .iter()
            .map(|ext| format!("{folder}.{ext}"))
            .collect()
    }

    /// Local folder of an already extracted bundle, or a fresh download.
    pub async fn fetch(&self, request: &SkinDownloadRequest) -> HelperResult<Utf8PathBuf> {
        let key = request.composite_key();
        let mod_dir = self.mods_dir.join(&key);

        if is_extracted_mod(&mod_dir) {
            tracing::debug!("Cache hit for {}: {}", key, mod_dir);
            return Ok(mod_dir);
        }

        for (url, ext) in self.urls(request).into_iter().zip(ARCHIVE_EXTENSIONS) {
            let Some(bytes) = self.get_with_retry(&url).await else {
                continue;
            };

            let archive = self.mods_dir.join(format!("{key}.{ext}"));
            match unpack_bundle(bytes, archive, mod_dir.clone()).await {
                Ok(count) => {
                    tracing::info!("Downloaded {} ({} files)", key, count);
                    return Ok(mod_dir);
                }
                Err(e) => tracing::warn!("Failed to extract {}: {}", url, e),
            }
        }

        Err(HelperError::NotFound(SKIN_NOT_FOUND.to_string()))
    }

    /// Body of `url`, or `None` after a 404 or repeated failures.
    async fn get_with_retry(&self, url: &str) -> Option<Vec<u8>> {
        for attempt in 1..=ATTEMPTS_PER_URL {
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, ATTEMPTS_PER_URL);

            match self.client.get(url).send().await {
                Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                    tracing::debug!("404 for {}", url);
                    return None;
                }
                Ok(response) if response.status().is_success() => match response.bytes().await {
                    Ok(bytes) => return Some(bytes.to_vec()),
                    Err(e) => tracing::warn!("Failed to read {}: {}", url, e),
                },
                Ok(response) => tracing::warn!("HTTP {} for {}", response.status(), url),
                Err(e) => tracing::warn!("Request to {} failed: {}", url, e),
            }

            if attempt < ATTEMPTS_PER_URL {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
        None
    }
}

fn is_skipped_entry(name: &str) -> bool {
    SKIPPED_ENTRY_PATTERNS.iter().any(|p| name.contains(p))
}

async fn unpack_bundle(
    bytes: Vec<u8>,
    archive: Utf8PathBuf,
    target: Utf8PathBuf,
) -> HelperResult<usize> {
    tokio::task::spawn_blocking(move || unpack_archive(&bytes, &archive, &target))
        .await
        .map_err(|e| HelperError::Message(format!("Extraction task failed: {e}")))?
}

/// Save a downloaded archive, extract it into `target`, then delete it.
fn unpack_archive(bytes: &[u8], archive: &Utf8Path, target: &Utf8Path) -> HelperResult<usize> {
    if let Some(parent) = archive.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(archive, bytes)?;
    tracing::debug!("Saved {} ({} bytes)", archive, bytes.len());

    let extracted = extract_zip(archive, target);
    if let Err(e) = fs::remove_file(archive) {
        tracing::warn!("Failed to remove {}: {}", archive, e);
    }
    extracted
}

/// Extract `archive` into a clean `target`, returning the number of files written.
pub fn extract_zip(archive: &Utf8Path, target: &Utf8Path) -> HelperResult<usize> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| HelperError::Message(format!("Invalid archive {archive}: {e}")))?;

    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| HelperError::Message(format!("Corrupt archive entry: {e}")))?;

        if is_skipped_entry(entry.name()) {
            tracing::trace!("Skipping {}", entry.name());
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out_path = target.as_std_path().join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}
