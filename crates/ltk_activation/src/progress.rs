//! Progress reporting for one activation call.
//!
//! A fresh [`ActivationProgress`] is created when an activation starts, mutated
//! as stages advance, and dropped when the call returns. Every mutation is
//! followed by a callback invocation with the current snapshot, so the UI sees
//! events in strict stage order.

use serde::Serialize;

/// Stages of the activation pipeline.
///
/// Emitted in order: `Detecting` -> `Downloading` -> `Preparing` -> `Activating`,
/// ending in either `Complete` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationStage {
    /// Resolving the game installation folder.
    Detecting,
    /// Fetching skin bundles in batches.
    Downloading,
    /// Resolving custom mods from their local paths.
    Preparing,
    /// Waiting on the helper's activate call.
    Activating,
    /// The overlay is active.
    Complete,
    /// The call failed; `message` says why.
    Error,
}

impl ActivationStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Snapshot of an activation's progress, as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationProgress {
    pub stage: ActivationStage,
    /// Number of items processed so far.
    pub current: usize,
    /// Total number of items in the request.
    pub total: usize,
    pub message: String,
    /// Item index most recently worked on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item_index: Option<usize>,
    /// Item indices that have been resolved, in completion order.
    pub completed_items: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vanguard_blocked: Option<bool>,
}

impl ActivationProgress {
    pub fn new(total: usize) -> Self {
        Self {
            stage: ActivationStage::Detecting,
            current: 0,
            total,
            message: String::new(),
            current_item_index: None,
            completed_items: Vec::new(),
            vanguard_blocked: None,
        }
    }

    /// Fraction of work done in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return if self.stage == ActivationStage::Complete { 1.0 } else { 0.0 };
        }
        (self.current.min(self.total) as f32) / (self.total as f32)
    }
}

pub(crate) type ProgressCallback<'a> = &'a (dyn Fn(&ActivationProgress) + Send + Sync);

/// Owns the per-call progress state and forwards each change to the callback.
pub(crate) struct ProgressReporter<'a> {
    progress: ActivationProgress,
    callback: ProgressCallback<'a>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(total: usize, callback: ProgressCallback<'a>) -> Self {
        Self {
            progress: ActivationProgress::new(total),
            callback,
        }
    }

    pub fn progress(&self) -> &ActivationProgress {
        &self.progress
    }

    /// Move to `stage` with `message` and emit.
    pub fn stage(&mut self, stage: ActivationStage, message: impl Into<String>) {
        self.progress.stage = stage;
        self.progress.message = message.into();
        self.emit();
    }

    /// Record completed indices within the current stage and emit.
    pub fn advance(
        &mut self,
        current: usize,
        completed: impl IntoIterator<Item = usize>,
        current_item_index: Option<usize>,
        message: impl Into<String>,
    ) {
        self.progress.current = current;
        self.progress.completed_items.extend(completed);
        self.progress.current_item_index = current_item_index;
        self.progress.message = message.into();
        self.emit();
    }

    /// Silently set the stage; the next emission carries it.
    pub fn enter(&mut self, stage: ActivationStage) {
        self.progress.stage = stage;
    }

    pub fn complete(&mut self, message: impl Into<String>) {
        let total = self.progress.total;
        self.progress.stage = ActivationStage::Complete;
        self.progress.current = total;
        self.progress.completed_items = (0..total).collect();
        self.progress.current_item_index = None;
        self.progress.message = message.into();
        self.emit();
    }

    pub fn fail(&mut self, message: impl Into<String>, vanguard_blocked: Option<bool>) {
        self.progress.stage = ActivationStage::Error;
        self.progress.message = message.into();
        self.progress.vanguard_blocked = vanguard_blocked;
        self.emit();
    }

    fn emit(&self) {
        (self.callback)(&self.progress);
    }
}
