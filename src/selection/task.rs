//! Background computation of a single segment.
//!
//! A task ends in exactly one of two ways: its segment is committed, or it is
//! discarded. The outcome is decided by one compare-exchange on an atomic
//! phase, so a completion racing a cancellation can never apply both or
//! neither.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::geometry::PolyLine;

const RUNNING: u8 = 0;
const COMPLETED: u8 = 1;
const CANCELLED: u8 = 2;

/// What a task has to say when polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Still computing. Carries the latest progress report, if a new one arrived.
    Running(Option<u8>),
    /// The computed segment, handed over exactly once.
    Completed(PolyLine),
    /// The task was cancelled, or the worker gave up without a segment.
    Cancelled,
}

enum Message {
    Progress(u8),
    Finished,
}

struct Shared {
    phase: AtomicU8,
    cancel: AtomicBool,
    result: Mutex<Option<PolyLine>>,
}

/// Handle given to the worker closure.
pub struct TaskContext {
    shared: Arc<Shared>,
    messages: Sender<Message>,
}

impl TaskContext {
    /// Raised once cancellation was requested; check it at safe points.
    pub fn cancel_flag(&self) -> &AtomicBool {
        &self.shared.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.load(Ordering::Acquire)
    }

    /// Report progress in percent. Reports are advisory and may be dropped.
    pub fn report(&self, percent: u8) {
        let _ = self.messages.send(Message::Progress(percent.min(100)));
    }

    fn finish(self, segment: Option<PolyLine>) {
        match segment {
            Some(segment) => {
                if let Ok(mut slot) = self.shared.result.lock() {
                    *slot = Some(segment);
                }
                let won = self
                    .shared
                    .phase
                    .compare_exchange(RUNNING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok();
                if !won {
                    if let Ok(mut slot) = self.shared.result.lock() {
                        slot.take();
                    }
                }
            }
            None => {
                let _ = self.shared.phase.compare_exchange(
                    RUNNING,
                    CANCELLED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
        }
        let _ = self.messages.send(Message::Finished);
    }
}

/// Owner side of a background segment computation.
pub struct SegmentTask {
    shared: Arc<Shared>,
    messages: Receiver<Message>,
    finished: bool,
}

impl SegmentTask {
    /// Run `work` on the rayon pool. Returning `None` discards the segment.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce(&TaskContext) -> Option<PolyLine> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            phase: AtomicU8::new(RUNNING),
            cancel: AtomicBool::new(false),
            result: Mutex::new(None),
        });
        let (sender, receiver) = mpsc::channel();
        let context = TaskContext {
            shared: Arc::clone(&shared),
            messages: sender,
        };

        rayon::spawn(move || {
            let segment = if context.is_cancelled() {
                None
            } else {
                work(&context)
            };
            context.finish(segment);
        });
        debug!("segment task spawned");

        SegmentTask {
            shared,
            messages: receiver,
            finished: false,
        }
    }

    /// A task that has already produced `segment`.
    pub fn ready(segment: PolyLine) -> Self {
        let (_, receiver) = mpsc::channel();
        SegmentTask {
            shared: Arc::new(Shared {
                phase: AtomicU8::new(COMPLETED),
                cancel: AtomicBool::new(false),
                result: Mutex::new(Some(segment)),
            }),
            messages: receiver,
            finished: true,
        }
    }

    /// Non-blocking check. Progress reports received since the last poll are
    /// coalesced into the most recent one.
    pub fn poll(&mut self) -> TaskStatus {
        let mut latest = None;
        loop {
            match self.messages.try_recv() {
                Ok(Message::Progress(percent)) => latest = Some(percent),
                Ok(Message::Finished) | Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        match self.settle() {
            Some(status) => status,
            // Worker went away without deciding the outcome
            None if self.finished => TaskStatus::Cancelled,
            None => TaskStatus::Running(latest),
        }
    }

    /// Block until the worker is done, then report its outcome.
    pub fn wait(&mut self) -> TaskStatus {
        while !self.finished {
            match self.messages.recv() {
                Ok(Message::Progress(_)) => {}
                Ok(Message::Finished) | Err(_) => self.finished = true,
            }
        }
        self.settle().unwrap_or(TaskStatus::Cancelled)
    }

    /// Request cancellation. If the worker already completed, the race is
    /// lost and its segment is returned instead of being discarded.
    pub fn cancel(&mut self) -> TaskStatus {
        self.shared.cancel.store(true, Ordering::Release);
        match self.shared.phase.compare_exchange(
            RUNNING,
            CANCELLED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                debug!("segment task cancelled");
                TaskStatus::Cancelled
            }
            Err(_) => self.settle().unwrap_or(TaskStatus::Cancelled),
        }
    }

    fn settle(&mut self) -> Option<TaskStatus> {
        match self.shared.phase.load(Ordering::Acquire) {
            COMPLETED => {
                let segment = self.shared.result.lock().ok()?.take();
                Some(segment.map_or(TaskStatus::Cancelled, TaskStatus::Completed))
            }
            CANCELLED => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

impl Drop for SegmentTask {
    fn drop(&mut self) {
        self.shared.cancel.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for SegmentTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentTask")
            .field("phase", &self.shared.phase.load(Ordering::Relaxed))
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::geometry::Point;
    use std::sync::mpsc::channel;

    fn line() -> PolyLine {
        PolyLine::new(Point::new(0, 0), Point::new(3, 4))
    }

    #[test]
    fn test_completes() {
        let mut task = SegmentTask::spawn(|ctx| {
            ctx.report(50);
            Some(line())
        });
        assert_eq!(task.wait(), TaskStatus::Completed(line()));
    }

    #[test]
    fn test_cancel_before_completion_discards() {
        let (release, gate) = channel::<()>();
        let mut task = SegmentTask::spawn(move |ctx| {
            let _ = gate.recv();
            if ctx.is_cancelled() {
                None
            } else {
                Some(line())
            }
        });

        assert_eq!(task.cancel(), TaskStatus::Cancelled);
        release.send(()).unwrap();
        assert_eq!(task.wait(), TaskStatus::Cancelled);
    }

    #[test]
    fn test_cancel_after_completion_returns_segment() {
        let mut task = SegmentTask::spawn(|_| Some(line()));
        while task.shared.phase.load(Ordering::Acquire) == RUNNING {
            std::thread::yield_now();
        }
        assert_eq!(task.cancel(), TaskStatus::Completed(line()));
    }

    #[test]
    fn test_worker_ignoring_cancel_is_still_discarded() {
        let (release, gate) = channel::<()>();
        let mut task = SegmentTask::spawn(move |_| {
            let _ = gate.recv();
            Some(line())
        });

        assert_eq!(task.cancel(), TaskStatus::Cancelled);
        release.send(()).unwrap();
        assert_eq!(task.wait(), TaskStatus::Cancelled);
    }

    #[test]
    fn test_ready() {
        let mut task = SegmentTask::ready(line());
        assert_eq!(task.poll(), TaskStatus::Completed(line()));
    }

    #[test]
    fn test_vanished_worker_reads_as_cancelled() {
        let (sender, receiver) = mpsc::channel::<Message>();
        drop(sender);
        let mut task = SegmentTask {
            shared: Arc::new(Shared {
                phase: AtomicU8::new(RUNNING),
                cancel: AtomicBool::new(false),
                result: Mutex::new(None),
            }),
            messages: receiver,
            finished: false,
        };

        assert_eq!(task.poll(), TaskStatus::Cancelled);
        assert_eq!(task.poll(), TaskStatus::Cancelled);
        assert_eq!(task.wait(), TaskStatus::Cancelled);
    }
}
