//! Tunables for the activation pipeline.

use serde::{Deserialize, Serialize};

/// Number of skin downloads issued together.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Configuration for an [`Orchestrator`](crate::Orchestrator).
///
/// Deserializes from a table such as:
///
/// ```toml
/// [activation]
/// batch_size = 5
/// verify_cached_paths = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Maximum number of concurrent skin downloads. Values below 1 are treated as 1.
    pub batch_size: usize,
    /// Treat a cached path that no longer exists on disk as a cache miss.
    pub verify_cached_paths: bool,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            verify_cached_paths: true,
        }
    }
}

impl ActivationConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
