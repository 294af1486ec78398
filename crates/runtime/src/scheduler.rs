use foundation::time::Time;

use crate::task::{Firing, TaskHandle, TaskId};

struct Entry {
    handle: TaskHandle,
    label: &'static str,
    period_ms: u64,
    next_due: Time,
    fired: u64,
    order: u64,
}

/// Deterministic virtual-time scheduler for repeating tasks.
///
/// This mirrors `setInterval` semantics without a browser: time only moves when
/// the caller advances it, so tests can run a simulation for an exact number of
/// ticks and then stop it.
///
/// Ordering contract:
/// - Firings come out in `(due_time, registration_order)` order.
/// - A task stopped through its [`TaskHandle`] never fires again.
#[derive(Default)]
pub struct TimerQueue {
    now: Time,
    next_order: u64,
    entries: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: Time) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    pub fn now(&self) -> Time {
        self.now
    }

    /// Registers a task firing every `period_ms`, first at `now + period_ms`.
    ///
    /// A zero period is clamped to 1 ms.
    pub fn every(&mut self, label: &'static str, period_ms: u64) -> TaskHandle {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        let period_ms = period_ms.max(1);
        let handle = TaskHandle::new(TaskId::new(order));
        self.entries.push(Entry {
            handle: handle.clone(),
            label,
            period_ms,
            next_due: self.now.plus_millis(period_ms),
            fired: 0,
            order,
        });
        handle
    }

    /// Number of tasks that have not been stopped.
    pub fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.handle.is_stopped())
            .count()
    }

    /// Pops the next firing due at or before `until`.
    ///
    /// Virtual time moves to the firing's due time. When nothing is due, time
    /// moves to `until` (never backwards) and `None` is returned. Call this in a
    /// loop so a task stopped by an earlier firing is honored.
    pub fn pop_due(&mut self, until: Time) -> Option<Firing> {
        self.entries.retain(|e| !e.handle.is_stopped());

        let next = self
            .entries
            .iter_mut()
            .filter(|e| e.next_due <= until)
            .min_by(|a, b| a.next_due.cmp(&b.next_due).then_with(|| a.order.cmp(&b.order)));

        let Some(entry) = next else {
            self.now = self.now.max(until);
            return None;
        };

        let firing = Firing {
            task: entry.handle.id(),
            label: entry.label,
            at: entry.next_due,
            index: entry.fired,
        };
        entry.fired += 1;
        entry.next_due = entry.next_due.plus_millis(entry.period_ms);
        self.now = self.now.max(firing.at);
        Some(firing)
    }

    /// Collects every firing due up to `until`.
    pub fn advance_to(&mut self, until: Time) -> Vec<Firing> {
        let mut out = Vec::new();
        while let Some(f) = self.pop_due(until) {
            out.push(f);
        }
        out
    }

    pub fn advance_by(&mut self, ms: u64) -> Vec<Firing> {
        let until = self.now.plus_millis(ms);
        self.advance_to(until)
    }
}
