//! Overlay lifecycle and game path management outside the pipeline.

use crate::error::HelperResult;
use crate::helper::{BrowseOutcome, NativeHelper, StopResponse};
use crate::orchestrator::Orchestrator;
use crate::sync::lock;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::atomic::Ordering;

impl<H: NativeHelper + ?Sized> Orchestrator<H> {
    /// Stop the overlay.
    ///
    /// The helper is always asked to stop, even if no overlay is known to be
    /// running. The fingerprint and cache survive, so re-activating the same
    /// selection still benefits from both.
    pub async fn stop(&self) -> StopResponse {
        let response = self.helper.stop_overlay().await;
        if response.success {
            lock(&self.session).overlay_running = false;
            tracing::info!("Overlay stopped");
        } else {
            tracing::warn!(
                "Stopping overlay failed: {}",
                response.error.as_deref().unwrap_or(&response.message)
            );
        }
        response
    }

    /// Ask the helper whether an overlay is alive and sync the local flag.
    ///
    /// Call this at startup to pick up an overlay left over from a previous run.
    pub async fn check_overlay_status(&self) -> bool {
        let running = self.helper.is_overlay_running().await;
        lock(&self.session).overlay_running = running;
        running
    }

    /// Last known overlay state, without asking the helper.
    pub fn is_overlay_running(&self) -> bool {
        lock(&self.session).overlay_running
    }

    pub fn is_activation_in_progress(&self) -> bool {
        self.activating.load(Ordering::Acquire)
    }

    /// Drop every cached path and the last fingerprint.
    ///
    /// Call after the on-disk mod cache has been cleared.
    pub fn invalidate_cache(&self) {
        lock(&self.cache).clear();
        lock(&self.session).last_fingerprint = None;
        tracing::debug!("Resolved path cache invalidated");
    }

    /// Game path used by the next activation, if one has been resolved.
    pub fn game_path(&self) -> Option<Utf8PathBuf> {
        lock(&self.session).game_path.clone()
    }

    /// Persist `path` through the helper and use it for the next activation.
    pub async fn set_game_path(&self, path: &Utf8Path) -> HelperResult<()> {
        self.helper.set_game_path(path).await?;
        lock(&self.session).game_path = Some(path.to_path_buf());
        tracing::info!("Game path set to {}", path);
        Ok(())
    }

    /// Let the user pick the game executable; a valid pick becomes the session game path.
    pub async fn browse_game_path(&self) -> BrowseOutcome {
        let outcome = self.helper.browse_game_path().await;
        if let BrowseOutcome::Selected(path) = &outcome {
            lock(&self.session).game_path = Some(path.clone());
            tracing::info!("Game path selected: {}", path);
        }
        outcome
    }

    /// Forget the configured game path. The next activation detects it again.
    pub async fn clear_game_path(&self) -> bool {
        let accepted = self.helper.clear_game_path().await;
        if accepted {
            lock(&self.session).game_path = None;
        }
        accepted
    }
}
