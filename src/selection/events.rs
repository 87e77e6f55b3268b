//! Change notifications emitted by the selection model.

use super::geometry::PolyLine;
use super::SelectionState;

/// A change observed on a selection model.
#[derive(Debug, Clone, Copy)]
pub enum SelectionEvent<'a> {
    /// The state machine moved from `old` to `new`.
    State {
        old: SelectionState,
        new: SelectionState,
    },
    /// The committed path changed; carries the path after the change.
    Selection(&'a [PolyLine]),
    /// Background segment computation progress, `0..=100`.
    Progress(u8),
}

impl SelectionEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            SelectionEvent::State { .. } => EventKind::State,
            SelectionEvent::Selection(_) => EventKind::Selection,
            SelectionEvent::Progress(_) => EventKind::Progress,
        }
    }
}

/// Event categories a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    State,
    Selection,
    Progress,
}

/// Handle returned by [`Listeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&SelectionEvent<'_>) + Send>;

struct Listener {
    id: ListenerId,
    kind: Option<EventKind>,
    callback: Callback,
}

/// Registry of event callbacks, invoked synchronously in subscription order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<Listener>,
}

impl Listeners {
    /// Register `callback` for events of `kind`, or for all events if `None`.
    pub fn subscribe<F>(&mut self, kind: Option<EventKind>, callback: F) -> ListenerId
    where
        F: FnMut(&SelectionEvent<'_>) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Listener {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|listener| listener.id != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &SelectionEvent<'_>) {
        let kind = event.kind();
        for listener in &mut self.entries {
            if listener.kind.map_or(true, |wanted| wanted == kind) {
                (listener.callback)(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
