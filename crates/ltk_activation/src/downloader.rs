//! Bounded-concurrency skin downloads.
//!
//! Skins are split into batches of [`ActivationConfig::effective_batch_size`]
//! items. All downloads of one batch are polled together and the whole batch is
//! awaited before the next one starts, so at most `batch_size` calls are ever
//! in flight. A failed download is logged and leaves its slot empty; it never
//! fails the batch.
//!
//! Before issuing a call the resolved-path cache is consulted. Items of the
//! same batch that share a composite key are downloaded once.

use crate::cache::ResolvedPathCache;
use crate::config::ActivationConfig;
use crate::helper::NativeHelper;
use crate::progress::{ActivationStage, ProgressReporter};
use crate::selection::SkinChoice;
use crate::sync::lock;
use camino::Utf8PathBuf;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) struct BatchDownloader<'a, H: NativeHelper + ?Sized> {
    helper: &'a H,
    cache: &'a Mutex<ResolvedPathCache>,
    config: &'a ActivationConfig,
}

impl<'a, H: NativeHelper + ?Sized> BatchDownloader<'a, H> {
    pub fn new(
        helper: &'a H,
        cache: &'a Mutex<ResolvedPathCache>,
        config: &'a ActivationConfig,
    ) -> Self {
        Self {
            helper,
            cache,
            config,
        }
    }

    /// Resolve every skin, returning one slot per skin in input order.
    ///
    /// Emits one `downloading` event per batch through `reporter`.
    pub async fn run(
        &self,
        skins: &[SkinChoice],
        reporter: &mut ProgressReporter<'_>,
    ) -> Vec<Option<Utf8PathBuf>> {
        let mut resolved: Vec<Option<Utf8PathBuf>> = vec![None; skins.len()];
        let batch_size = self.config.effective_batch_size();
        let batch_count = skins.len().div_ceil(batch_size);
        let mut succeeded_total = 0usize;

        reporter.enter(ActivationStage::Downloading);

        for (batch_index, batch) in skins.chunks(batch_size).enumerate() {
            let offset = batch_index * batch_size;
            let keys: Vec<String> = batch.iter().map(SkinChoice::composite_key).collect();

            let (hits, misses) = self.partition_by_cache(batch, &keys);

            let downloads = misses.iter().map(|&(key, skin)| async move {
                let result = self.helper.download_skin(&skin.download_request()).await;
                (key.as_str(), skin, result)
            });

            let mut fetched: HashMap<&str, Utf8PathBuf> = HashMap::new();
            for (key, skin, result) in join_all(downloads).await {
                match result {
                    Ok(path) => {
                        tracing::debug!("Downloaded {} to {}", key, path);
                        lock(self.cache).put(key, path.clone());
                        fetched.insert(key, path);
                    }
                    Err(error) => {
                        tracing::warn!(
                            "Skipping '{}' ({}): download failed: {}",
                            skin.display_name(),
                            key,
                            error
                        );
                    }
                }
            }

            let mut batch_succeeded = Vec::new();
            for (i, key) in keys.iter().enumerate() {
                let path = hits
                    .get(key.as_str())
                    .or_else(|| fetched.get(key.as_str()))
                    .cloned();
                if path.is_some() {
                    batch_succeeded.push(offset + i);
                }
                resolved[offset + i] = path;
            }

            succeeded_total += batch_succeeded.len();
            let attempted = offset + batch.len();
            tracing::info!(
                "Download batch {}/{} finished: {} attempted, {} resolved",
                batch_index + 1,
                batch_count,
                attempted,
                succeeded_total
            );
            reporter.advance(
                attempted,
                batch_succeeded,
                Some(attempted - 1),
                format!("Downloaded {succeeded_total}/{} skins", skins.len()),
            );
        }

        resolved
    }

    /// Split a batch into cached paths and deduplicated downloads.
    fn partition_by_cache<'b>(
        &self,
        batch: &'b [SkinChoice],
        keys: &'b [String],
    ) -> (HashMap<&'b str, Utf8PathBuf>, Vec<(&'b String, &'b SkinChoice)>) {
        let mut hits = HashMap::new();
        let mut misses: Vec<(&String, &SkinChoice)> = Vec::new();
        let mut cache = lock(self.cache);

        for (key, skin) in keys.iter().zip(batch) {
            if hits.contains_key(key.as_str()) || misses.iter().any(|(k, _)| *k == key) {
                continue;
            }

            match cache.get(key).map(|path| path.to_path_buf()) {
                Some(path) if !self.config.verify_cached_paths || path.exists() => {
                    tracing::debug!("Reusing cached path for {}", key);
                    hits.insert(key.as_str(), path);
                }
                Some(path) => {
                    tracing::debug!("Cached path {} for {} is gone, downloading again", path, key);
                    cache.remove(key);
                    misses.push((key, skin));
                }
                None => misses.push((key, skin)),
            }
        }

        (hits, misses)
    }
}
