//! Boundary selection on images.
//!
//! This module provides the path-tracing selection tool:
//! - **Selection model**: control points joined into a closable path, with a
//!   state machine, undo/redo and point relocation
//! - **Segment tools**: straight point-to-point lines, or background-computed
//!   segments such as the edge-snapping scissors
//! - **Mask extraction**: alpha mask and PNG export of the enclosed pixels

use std::fmt;

pub mod events;
pub mod geometry;
pub(crate) mod history;
pub mod mask;
pub mod model;
pub mod path;
pub mod task;
pub mod tools;

pub use events::{EventKind, ListenerId, SelectionEvent};
pub use geometry::{Point, PolyLine};
pub use mask::{extract_selection, selection_mask, write_png};
pub use model::SelectionModel;
pub use path::SelectionPath;
pub use task::{SegmentTask, TaskContext, TaskStatus};
pub use tools::{PointToPoint, SegmentJob, SegmentTool};

/// Where a selection model is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionState {
    /// No anchor placed.
    #[default]
    NoSelection,
    /// Anchor placed; points may be appended.
    Selecting,
    /// A segment is being computed in the background.
    Processing,
    /// The path is closed.
    Selected,
}

impl SelectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionState::NoSelection => "NO_SELECTION",
            SelectionState::Selecting => "SELECTING",
            SelectionState::Processing => "PROCESSING",
            SelectionState::Selected => "SELECTED",
        }
    }

    /// Whether the path is closed and its points can be moved.
    pub fn is_finished(self) -> bool {
        self == SelectionState::Selected
    }
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
