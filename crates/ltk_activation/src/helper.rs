//! Native helper abstraction.
//!
//! The [`NativeHelper`] trait decouples the orchestrator from the privileged
//! process that actually finds the game, downloads skin bundles and writes the
//! overlay. The orchestrator only sequences these calls; it never knows how an
//! asset is applied.
//!
//! # Implementing
//!
//! Implementations must be `Send + Sync`: the orchestrator holds the helper in
//! an [`Arc`](std::sync::Arc) and issues several [`download_skin`](NativeHelper::download_skin)
//! calls concurrently while a batch is in flight. Every other operation is
//! called at most once at a time.

use crate::error::HelperResult;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Identifies one downloadable skin variant.
///
/// At most one of `chroma_id` and `form_id` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinDownloadRequest {
    pub champion_id: u32,
    pub skin_id: u32,
    pub chroma_id: Option<u32>,
    pub form_id: Option<u32>,
}

impl SkinDownloadRequest {
    /// `{champion}_{skin}`, `{champion}_{skin}_form_{form}` or
    /// `{champion}_{skin}_chroma_{chroma}`. A form wins over a chroma.
    pub fn composite_key(&self) -> String {
        match (self.form_id, self.chroma_id) {
            (Some(form_id), _) => {
                format!("{}_{}_form_{}", self.champion_id, self.skin_id, form_id)
            }
            (None, Some(chroma_id)) => {
                format!("{}_{}_chroma_{}", self.champion_id, self.skin_id, chroma_id)
            }
            (None, None) => format!("{}_{}", self.champion_id, self.skin_id),
        }
    }

    /// The variant id the bundle is published under, if any.
    pub fn variant_id(&self) -> Option<u32> {
        self.form_id.or(self.chroma_id)
    }
}

/// One resolved asset handed to the helper for activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateItem {
    /// Composite key of a skin, or the id of a custom mod. Unique per request.
    pub id: String,
    pub name: String,
    pub local_path: Utf8PathBuf,
    pub is_custom: bool,
}

/// Everything the helper needs to apply one activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    /// Skins first, custom mods second, in item-index order.
    pub items: Vec<ActivateItem>,
    pub game_path: Utf8PathBuf,
    /// The selection fingerprint equals the one of the last successful
    /// activation. Helpers may use this to skip rebuilding work.
    pub selection_unchanged: bool,
}

/// Outcome of the helper's activate operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateResponse {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
    /// Security software in the game client prevented the write.
    #[serde(default)]
    pub vanguard_blocked: bool,
}

impl ActivateResponse {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            vanguard_blocked: false,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: String::new(),
            error: Some(error.into()),
            vanguard_blocked: false,
        }
    }

    pub fn blocked(error: impl Into<String>) -> Self {
        Self {
            vanguard_blocked: true,
            ..Self::failed(error)
        }
    }

    /// The most specific failure text available, verbatim.
    pub fn failure_message(&self) -> String {
        match &self.error {
            Some(error) if !error.is_empty() => error.clone(),
            _ if !self.message.is_empty() => self.message.clone(),
            _ => "Activation failed".to_string(),
        }
    }
}

/// Outcome of stopping the overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

/// Outcome of asking the user to pick the game executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum BrowseOutcome {
    /// A valid game folder was picked.
    Selected(Utf8PathBuf),
    /// The user closed the dialog.
    Cancelled,
    /// Something other than the game executable was picked.
    Invalid(String),
}

/// Operations provided by the privileged native helper.
#[async_trait]
pub trait NativeHelper: Send + Sync {
    /// Locate the game folder, preferring a manually configured one.
    async fn detect_game_path(&self) -> Option<Utf8PathBuf>;

    /// Persist a manually chosen game folder.
    async fn set_game_path(&self, path: &Utf8Path) -> HelperResult<()>;

    /// Let the user pick the game executable.
    async fn browse_game_path(&self) -> BrowseOutcome;

    /// Forget the manually configured game folder. Returns whether it was accepted.
    async fn clear_game_path(&self) -> bool;

    /// Download (or reuse) one skin bundle and return its local path.
    async fn download_skin(&self, request: &SkinDownloadRequest) -> HelperResult<Utf8PathBuf>;

    /// Apply the resolved assets to the game client.
    async fn activate(&self, request: &ActivateRequest) -> ActivateResponse;

    /// Stop the running overlay.
    async fn stop_overlay(&self) -> StopResponse;

    /// Whether an overlay process is currently alive.
    async fn is_overlay_running(&self) -> bool;

    /// Replace the helper component that security software blocked.
    async fn refresh_helper(&self) -> bool;
}
