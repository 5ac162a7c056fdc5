//! Cancellable scheduled tasks.
//!
//! The engine never sleeps. It records what it wants to happen later as a
//! `ScheduledTask` and hands the host a `TaskId` to call back with. Every
//! schedule gets a fresh id, so a callback for a task that was cancelled or
//! replaced is recognised as stale and dropped.

#[cfg(test)]
#[path = "timer_test.rs"]
mod timer_test;

/// Handle for one scheduled task. Never reused within an engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What a task does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Close the external jump override window.
    ExternalLockExpiry,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Host timestamp in ms at which the task is due.
    pub due_ms: f64,
}

impl ScheduledTask {
    /// Delay from `now_ms` until the task is due, never negative.
    #[must_use]
    pub fn delay_from(&self, now_ms: f64) -> f64 {
        (self.due_ms - now_ms).max(0.0)
    }
}

/// The set of pending tasks.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    next_id: u64,
    pending: Vec<ScheduledTask>,
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire at `due_ms`.
    pub fn schedule(&mut self, kind: TaskKind, due_ms: f64) -> ScheduledTask {
        self.next_id += 1;
        let task = ScheduledTask { id: TaskId(self.next_id), kind, due_ms };
        self.pending.push(task);
        task
    }

    /// Cancel every pending task of `kind`, then schedule a new one.
    ///
    /// Returns the cancelled ids along with the new task.
    pub fn reschedule(&mut self, kind: TaskKind, due_ms: f64) -> (Vec<TaskId>, ScheduledTask) {
        let cancelled = self.cancel_kind(kind);
        (cancelled, self.schedule(kind, due_ms))
    }

    /// Cancel every pending task of `kind`, returning their ids.
    pub fn cancel_kind(&mut self, kind: TaskKind) -> Vec<TaskId> {
        let mut cancelled = Vec::new();
        self.pending.retain(|t| {
            if t.kind == kind {
                cancelled.push(t.id);
                false
            } else {
                true
            }
        });
        cancelled
    }

    /// Cancel everything, returning the ids.
    pub fn cancel_all(&mut self) -> Vec<TaskId> {
        self.pending.drain(..).map(|t| t.id).collect()
    }

    /// Host callback: the task's timer elapsed. Returns its kind, or `None`
    /// if the task was cancelled or already fired.
    pub fn fire(&mut self, id: TaskId) -> Option<TaskKind> {
        let index = self.pending.iter().position(|t| t.id == id)?;
        Some(self.pending.remove(index).kind)
    }

    #[cfg(test)]
    #[must_use]
    pub fn pending(&self, kind: TaskKind) -> Option<&ScheduledTask> {
        self.pending.iter().find(|t| t.kind == kind)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
