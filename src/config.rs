//! Tunable settings for selection models and the scissors tool.

use crate::scissors::Weight;

/// Undo depth kept by a selection model unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 128;

/// Settled pixels between two cancellation checks of a snapping search.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 4096;

/// Settings shared by the selection model and its tools.
///
/// # Example
/// ```
/// use imagestag_selector::{SelectorConfig, Weight};
///
/// let config = SelectorConfig::default()
///     .with_weight(Weight::ColorBand)
///     .with_history_limit(32);
/// assert_eq!(config.history_limit, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Maximum number of edits that can be undone.
    pub history_limit: usize,
    /// Settled pixels between cancellation checks and progress reports.
    pub progress_interval: usize,
    /// Edge weighting used by the scissors tool.
    pub weight: Weight,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            weight: Weight::CrossGradMono,
        }
    }
}

impl SelectorConfig {
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }
}
