//! The activation pipeline.
//!
//! # Stages
//!
//! 1. **Detecting**: resolve the game folder, once per session.
//! 2. **Downloading**: fetch skin bundles in bounded batches (see [`crate::downloader`]).
//! 3. **Preparing**: resolve custom mods from their local paths.
//! 4. **Activating**: hand the resolved list to the helper in a single call.
//! 5. **Complete** or **Error**.
//!
//! Only one pipeline runs at a time per [`Orchestrator`]. A call made while
//! another is in flight fails immediately with
//! [`ActivationError::AlreadyInProgress`]. It emits a single error event and
//! leaves every piece of session state untouched.
//!
//! # Fast path
//!
//! The request fingerprint is compared with the one of the last successful
//! activation. The result is forwarded to the helper as
//! [`ActivateRequest::selection_unchanged`]; every stage still runs, since
//! cached files may have been removed out of band.

use crate::cache::ResolvedPathCache;
use crate::config::ActivationConfig;
use crate::downloader::BatchDownloader;
use crate::error::ActivationError;
use crate::fingerprint::fingerprint;
use crate::helper::{ActivateItem, ActivateRequest, NativeHelper};
use crate::progress::{ActivationProgress, ActivationStage, ProgressReporter};
use crate::recovery::recover;
use crate::selection::ActivationRequest;
use crate::sync::lock;
use camino::Utf8PathBuf;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationSummary {
    /// Helper message, shown to the user as-is.
    pub message: String,
    /// Number of items handed to the helper.
    pub activated: usize,
    /// Display names of skins whose download failed and were left out.
    pub skipped: Vec<String>,
    /// The selection matched the previous successful activation.
    pub selection_unchanged: bool,
}

/// State that outlives a single activation call.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub game_path: Option<Utf8PathBuf>,
    pub last_fingerprint: Option<String>,
    pub overlay_running: bool,
}

/// Sequences one activation at a time against a [`NativeHelper`].
///
/// Usually built once at application start and shared by handle.
///
/// ```ignore
/// let orchestrator = Orchestrator::new(Arc::new(helper));
/// let summary = orchestrator
///     .activate(&request, |progress| println!("{:?}", progress.stage))
///     .await?;
/// ```
pub struct Orchestrator<H: NativeHelper + ?Sized = dyn NativeHelper> {
    pub(crate) helper: Arc<H>,
    pub(crate) config: ActivationConfig,
    pub(crate) session: Mutex<Session>,
    pub(crate) cache: Mutex<ResolvedPathCache>,
    pub(crate) activating: AtomicBool,
}

impl<H: NativeHelper + ?Sized> Orchestrator<H> {
    pub fn new(helper: Arc<H>) -> Self {
        Self::with_config(helper, ActivationConfig::default())
    }

    pub fn with_config(helper: Arc<H>, config: ActivationConfig) -> Self {
        Self {
            helper,
            config,
            session: Mutex::new(Session::default()),
            cache: Mutex::new(ResolvedPathCache::new()),
            activating: AtomicBool::new(false),
        }
    }

    pub fn helper(&self) -> &Arc<H> {
        &self.helper
    }

    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    /// Run the full pipeline for `request`.
    ///
    /// `on_progress` is called with a snapshot after every state change. When
    /// this returns an error, the last snapshot delivered has stage
    /// [`ActivationStage::Error`].
    pub async fn activate<F>(
        &self,
        request: &ActivationRequest,
        on_progress: F,
    ) -> Result<ActivationSummary, ActivationError>
    where
        F: Fn(&ActivationProgress) + Send + Sync,
    {
        let total = request.len();
        let mut reporter = ProgressReporter::new(total, &on_progress);

        let Some(_guard) = ActivationGuard::acquire(&self.activating) else {
            tracing::warn!("Activation requested while another activation is running");
            let error = ActivationError::AlreadyInProgress;
            reporter.fail(error.to_string(), None);
            return Err(error);
        };

        if request.is_empty() {
            let error = ActivationError::EmptySelection;
            reporter.fail(error.to_string(), None);
            return Err(error);
        }

        tracing::info!(
            "Activating {} skin(s) and {} custom mod(s)",
            request.skins().len(),
            request.customs().len()
        );

        reporter.stage(ActivationStage::Detecting, "Detecting game installation");
        let Some(game_path) = self.resolve_game_path().await else {
            return Err(self.fail(&mut reporter, ActivationError::GamePathNotFound));
        };
        tracing::info!("Game path: {}", game_path);

        let current_fingerprint = fingerprint(request);
        let selection_unchanged = lock(&self.session).last_fingerprint.as_deref()
            == Some(current_fingerprint.as_str());
        if selection_unchanged {
            tracing::debug!("Selection unchanged since last activation");
        }

        let downloader = BatchDownloader::new(self.helper.as_ref(), &self.cache, &self.config);
        let skin_paths = downloader.run(request.skins(), &mut reporter).await;

        let mut items = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        for (skin, path) in request.skins().iter().zip(skin_paths) {
            match path {
                Some(local_path) => items.push(ActivateItem {
                    id: skin.composite_key(),
                    name: skin.display_name(),
                    local_path,
                    is_custom: false,
                }),
                None => skipped.push(skin.display_name()),
            }
        }

        reporter.enter(ActivationStage::Preparing);
        let offset = request.skins().len();
        for (i, custom) in request.customs().iter().enumerate() {
            let index = offset + i;
            items.push(ActivateItem {
                id: custom.id.clone(),
                name: custom.display_name.clone(),
                local_path: custom.local_path.clone(),
                is_custom: true,
            });
            reporter.advance(
                index + 1,
                [index],
                Some(index),
                format!("Prepared {}", custom.display_name),
            );
        }

        if items.is_empty() {
            return Err(self.fail(&mut reporter, ActivationError::NothingResolved { failed: total }));
        }
        if !skipped.is_empty() {
            tracing::warn!(
                "Continuing without {} skin(s) that failed to download",
                skipped.len()
            );
        }

        reporter.stage(
            ActivationStage::Activating,
            format!("Activating {} item(s)", items.len()),
        );
        let activated = items.len();
        let response = self
            .helper
            .activate(&ActivateRequest {
                items,
                game_path,
                selection_unchanged,
            })
            .await;

        if !response.success {
            let error = recover(self.helper.as_ref(), &response).await;
            return Err(self.fail(&mut reporter, error));
        }

        let message = if response.message.is_empty() {
            "Overlay active".to_string()
        } else {
            response.message
        };
        {
            let mut session = lock(&self.session);
            session.last_fingerprint = Some(current_fingerprint);
            session.overlay_running = true;
        }
        reporter.complete(message.clone());
        tracing::info!("Activation complete: {}", message);

        Ok(ActivationSummary {
            message,
            activated,
            skipped,
            selection_unchanged,
        })
    }

    /// Cached game path, or whatever the helper detects.
    async fn resolve_game_path(&self) -> Option<Utf8PathBuf> {
        let cached = lock(&self.session).game_path.clone();
        if cached.is_some() {
            return cached;
        }

        let detected = self.helper.detect_game_path().await?;
        lock(&self.session).game_path = Some(detected.clone());
        Some(detected)
    }

    /// Emit the terminal error event and mark the overlay as not running.
    fn fail(&self, reporter: &mut ProgressReporter<'_>, error: ActivationError) -> ActivationError {
        lock(&self.session).overlay_running = false;
        reporter.fail(error.to_string(), error.vanguard_blocked().then_some(true));
        error
    }
}

/// Holds the single-pipeline flag for the duration of an activation.
struct ActivationGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ActivationGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
