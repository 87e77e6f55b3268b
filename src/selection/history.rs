//! Undo/redo bookkeeping for selection edits.

use std::collections::VecDeque;

use super::geometry::{Point, PolyLine};
use super::path::SelectionPath;
use super::SelectionState;

/// A committed change to the selection path, with enough data to revert it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Edit {
    /// The first point was placed.
    Anchor(Point),
    /// A segment was appended while selecting.
    Append(PolyLine),
    /// The closing segment was appended by finishing.
    Close(PolyLine),
    /// A control point was relocated.
    Move {
        index: usize,
        before: Reconnection,
        after: Reconnection,
    },
}

/// The parts of a finished path touched by relocating one control point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reconnection {
    pub start: Point,
    pub incoming: PolyLine,
    pub outgoing: PolyLine,
}

impl Edit {
    /// Re-apply this edit to `path`; returns the resulting state.
    pub(crate) fn apply(&self, path: &mut SelectionPath) -> SelectionState {
        match self {
            Edit::Anchor(point) => {
                path.set_anchor(*point);
                SelectionState::Selecting
            }
            Edit::Append(segment) => {
                path.push(segment.clone());
                SelectionState::Selecting
            }
            Edit::Close(segment) => {
                path.push(segment.clone());
                SelectionState::Selected
            }
            Edit::Move { index, after, .. } => {
                path.reconnect(*index, after.clone());
                SelectionState::Selected
            }
        }
    }

    /// Undo this edit on `path`; returns the resulting state.
    pub(crate) fn revert(&self, path: &mut SelectionPath) -> SelectionState {
        match self {
            Edit::Anchor(_) => {
                path.clear();
                SelectionState::NoSelection
            }
            Edit::Append(_) | Edit::Close(_) => {
                path.pop();
                SelectionState::Selecting
            }
            Edit::Move { index, before, .. } => {
                path.reconnect(*index, before.clone());
                SelectionState::Selected
            }
        }
    }
}

/// A bounded stack of edits that can be undone and redone.
#[derive(Debug)]
pub(crate) struct History<T> {
    max_undo_count: usize,
    stack: VecDeque<T>,
    /// Number of edits in `stack` currently applied.
    live: usize,
}

impl<T> History<T> {
    pub(crate) fn new(max_undo_count: usize) -> Self {
        History {
            max_undo_count: max_undo_count.max(1),
            stack: VecDeque::new(),
            live: 0,
        }
    }

    /// Record a newly applied edit, dropping anything that was undone.
    pub(crate) fn record(&mut self, item: T) {
        self.stack.truncate(self.live);
        self.stack.push_back(item);
        self.live += 1;

        if self.stack.len() > self.max_undo_count {
            self.stack.pop_front();
            self.live -= 1;
        }
    }

    /// The edit to revert, if any.
    pub(crate) fn undo(&mut self) -> Option<&T> {
        if self.live == 0 {
            return None;
        }
        self.live -= 1;
        self.stack.get(self.live)
    }

    /// The edit to re-apply, if any.
    pub(crate) fn redo(&mut self) -> Option<&T> {
        if self.live == self.stack.len() {
            return None;
        }
        self.live += 1;
        self.stack.get(self.live - 1)
    }

    pub(crate) fn can_undo(&self) -> bool {
        self.live > 0
    }

    pub(crate) fn can_redo(&self) -> bool {
        self.live < self.stack.len()
    }

    pub(crate) fn clear(&mut self) {
        self.stack.clear();
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_order() {
        let mut history = History::new(8);
        history.record(1);
        history.record(2);

        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&1));
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_record_drops_redo_tail() {
        let mut history = History::new(8);
        history.record(1);
        history.record(2);
        history.undo();
        history.record(3);

        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), Some(&1));
    }

    #[test]
    fn test_limit() {
        let mut history = History::new(2);
        history.record(1);
        history.record(2);
        history.record(3);

        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), Some(&2));
        assert!(!history.can_undo());
    }
}
