//! Error types for activation.
//!
//! Two families live here:
//!
//! - [`HelperError`] is what a [`NativeHelper`](crate::NativeHelper) reports when
//!   one of its operations cannot complete (a download that 404s, a rejected
//!   game path, ...).
//! - [`ActivationError`] is the terminal outcome of one
//!   [`Orchestrator::activate`](crate::Orchestrator::activate) call. Its variants
//!   are the failure taxonomy the UI distinguishes; the `Display` string is the
//!   message shown to the user as-is.
//!
//! [`ActivationResponse`] is the flat, serializable envelope for callers that
//! cross a process boundary (IPC, JSON output).

use crate::orchestrator::ActivationSummary;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias for helper operations.
pub type HelperResult<T> = std::result::Result<T, HelperError>;

/// Errors reported by a native helper operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HelperError {
    /// The requested asset does not exist at the remote source.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote source could not be reached or returned an unusable response.
    #[error("Network error: {0}")]
    Network(String),

    /// Local filesystem operation failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Catch-all carrying the helper's own message.
    #[error("{0}")]
    Message(String),
}

impl From<std::io::Error> for HelperError {
    fn from(err: std::io::Error) -> Self {
        HelperError::Io(err.to_string())
    }
}

impl From<String> for HelperError {
    fn from(s: String) -> Self {
        HelperError::Message(s)
    }
}

/// Machine-readable failure code, serialized as SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationErrorCode {
    AlreadyInProgress,
    EmptySelection,
    GamePathNotFound,
    NothingResolved,
    ActivationFailed,
    SecurityBlocked,
}

/// Terminal failure of an activation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// Another activation is still running. No state was touched.
    #[error("Activation already in progress")]
    AlreadyInProgress,

    /// The request contained no skins and no custom mods.
    #[error("No skins or custom mods selected")]
    EmptySelection,

    /// No game installation could be detected; the user has to configure it.
    #[error("League of Legends installation not found. Please set the game folder manually in settings.")]
    GamePathNotFound,

    /// Every item failed to resolve to a local asset.
    #[error("None of the {failed} selected item(s) could be prepared for activation")]
    NothingResolved { failed: usize },

    /// The helper rejected the activation for a reason other than security software.
    #[error("{message}")]
    Native { message: String },

    /// Security software blocked the overlay. `refreshed` tells whether the
    /// one-shot helper refresh succeeded, in which case retrying is likely to work.
    #[error("{}", security_message(.refreshed))]
    SecurityBlocked { refreshed: bool },
}

fn security_message(refreshed: &bool) -> &'static str {
    if *refreshed {
        "Security software blocked the overlay. The helper was refreshed, please try activating again."
    } else {
        "Security software blocked the overlay and refreshing the helper failed. Restart the client and try again."
    }
}

impl ActivationError {
    pub fn code(&self) -> ActivationErrorCode {
        match self {
            Self::AlreadyInProgress => ActivationErrorCode::AlreadyInProgress,
            Self::EmptySelection => ActivationErrorCode::EmptySelection,
            Self::GamePathNotFound => ActivationErrorCode::GamePathNotFound,
            Self::NothingResolved { .. } => ActivationErrorCode::NothingResolved,
            Self::Native { .. } => ActivationErrorCode::ActivationFailed,
            Self::SecurityBlocked { .. } => ActivationErrorCode::SecurityBlocked,
        }
    }

    /// Whether this failure was caused by security software.
    pub fn vanguard_blocked(&self) -> bool {
        matches!(self, Self::SecurityBlocked { .. })
    }

    /// Whether re-invoking the activation is expected to succeed without
    /// further user action.
    pub fn retry_recommended(&self) -> bool {
        matches!(self, Self::SecurityBlocked { refreshed: true })
    }
}

/// Serializable result of an activation call.
///
/// Serializes to `{ "success": true, "message": "..." }` or
/// `{ "success": false, "message": "...", "error": "...", "code": "...", "vanguardBlocked": true }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ActivationErrorCode>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub vanguard_blocked: bool,
}

impl From<Result<ActivationSummary, ActivationError>> for ActivationResponse {
    fn from(result: Result<ActivationSummary, ActivationError>) -> Self {
        match result {
            Ok(summary) => Self {
                success: true,
                message: summary.message,
                error: None,
                code: None,
                vanguard_blocked: false,
            },
            Err(error) => Self {
                success: false,
                message: error.to_string(),
                error: Some(error.to_string()),
                code: Some(error.code()),
                vanguard_blocked: error.vanguard_blocked(),
            },
        }
    }
}
