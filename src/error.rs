//! Error types shared by the queue, the selection model and the export layer.

use thiserror::Error;

use crate::selection::SelectionState;

/// Result type for selector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by selector operations.
///
/// Apart from [`Error::Encode`], every variant is a violated precondition on
/// the caller's side. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// A read or removal was attempted on an empty queue.
    #[error("collection is empty")]
    EmptyCollection,

    /// A mutation was attempted in a state that forbids it.
    #[error("{operation} is not allowed in state {state}")]
    IllegalState {
        operation: &'static str,
        state: SelectionState,
    },

    /// An argument was outside the valid range for the current path or image.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The selected pixels could not be encoded.
    #[error("failed to encode selection: {0}")]
    Encode(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn illegal_state(operation: &'static str, state: SelectionState) -> Self {
        Error::IllegalState { operation, state }
    }
}

/// Images are accepted with 1 (gray), 3 (RGB) or 4 (RGBA) channels.
pub(crate) fn check_channels(channels: usize) -> Result<()> {
    if matches!(channels, 1 | 3 | 4) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "unsupported channel count {channels}"
        )))
    }
}
