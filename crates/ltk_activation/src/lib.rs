//! Mod activation orchestrator.
//!
//! Turns a user's selection of skins (with optional chroma or form) and local
//! custom mods into a single activation call against a privileged
//! [`NativeHelper`], reporting progress along the way.
//!
//! # Overview
//!
//! ```text
//! ActivationRequest
//!   -> detect game path (cached per session)
//!   -> fingerprint (fast-path hint for the helper)
//!   -> batch downloads (bounded concurrency, partial failures tolerated)
//!   -> prepare custom mods (local, no I/O)
//!   -> helper.activate() once
//!   -> classify failure, refresh helper once if security software blocked it
//! ```
//!
//! The [`Orchestrator`] owns all session state: the cached game path, the last
//! successful fingerprint, the resolved-path cache and the overlay flag. It is
//! meant to be created once by the application and shared by handle.
//!
//! # Progress
//!
//! [`Orchestrator::activate`] takes a callback that receives an
//! [`ActivationProgress`] snapshot after every change. Stages are delivered in
//! order and download events arrive one per batch, in batch order.

pub mod cache;
pub mod config;
pub(crate) mod downloader;
pub mod error;
pub mod fingerprint;
pub mod helper;
mod lifecycle;
pub mod orchestrator;
pub mod progress;
pub mod recovery;
pub mod selection;
mod sync;

#[cfg(test)]
mod tests;

pub use cache::ResolvedPathCache;
pub use config::{ActivationConfig, DEFAULT_BATCH_SIZE};
pub use error::{
    ActivationError, ActivationErrorCode, ActivationResponse, HelperError, HelperResult,
};
pub use fingerprint::fingerprint;
pub use helper::{
    ActivateItem, ActivateRequest, ActivateResponse, BrowseOutcome, NativeHelper,
    SkinDownloadRequest, StopResponse,
};
pub use orchestrator::{ActivationSummary, Orchestrator};
pub use progress::{ActivationProgress, ActivationStage};
pub use recovery::FailureKind;
pub use selection::{
    ActivationRequest, CustomModChoice, Selection, SelectionItem, SelectionRef, SkinChoice,
};
