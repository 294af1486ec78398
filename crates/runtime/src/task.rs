use std::cell::Cell;
use std::rc::Rc;

/// Identifies a repeating task registered with a [`crate::TimerQueue`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Cancellation handle for a repeating task.
///
/// Clones share the same flag. Stopping is permanent: a stopped task is never
/// fired again, even if it was already due.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    stopped: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            stopped: Rc::new(Cell::new(false)),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// One execution of a repeating task.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Firing {
    pub task: TaskId,
    pub label: &'static str,
    /// Virtual time the firing was scheduled for.
    pub at: foundation::time::Time,
    /// 0-based count of previous firings of the same task.
    pub index: u64,
}
