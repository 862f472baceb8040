//! Failure classification for the activating stage.
//!
//! A failed activate response is either a plain native failure, reported to
//! the user verbatim, or a security-software block. A block triggers exactly
//! one helper refresh; the pipeline is never re-run automatically.

use crate::error::ActivationError;
use crate::helper::{ActivateResponse, NativeHelper};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The helper failed for its own reasons. Carries its message verbatim.
    Native(String),
    /// Security software in the game client blocked the overlay.
    SecurityBlocked,
}

/// Classify a failed activate response.
pub fn classify(response: &ActivateResponse) -> FailureKind {
    if response.vanguard_blocked {
        FailureKind::SecurityBlocked
    } else {
        FailureKind::Native(response.failure_message())
    }
}

/// Turn a failed activate response into the terminal error of this call,
/// running the one-shot remediation when security software is involved.
pub(crate) async fn recover<H: NativeHelper + ?Sized>(
    helper: &H,
    response: &ActivateResponse,
) -> ActivationError {
    match classify(response) {
        FailureKind::Native(message) => {
            tracing::error!("Activation failed: {}", message);
            ActivationError::Native { message }
        }
        FailureKind::SecurityBlocked => {
            tracing::warn!(
                "Overlay blocked by security software ({}), refreshing helper",
                response.failure_message()
            );
            let refreshed = helper.refresh_helper().await;
            if refreshed {
                tracing::info!("Helper refreshed");
            } else {
                tracing::error!("Helper refresh failed");
            }
            ActivationError::SecurityBlocked { refreshed }
        }
    }
}
