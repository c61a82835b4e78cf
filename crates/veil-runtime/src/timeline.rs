#![forbid(unsafe_code)]

//! Deterministic task timeline over a virtual clock.
//!
//! [`Timeline<T>`] stores tasks keyed by deadline. The host advances the
//! clock explicitly and pulls due tasks one at a time, so that work a task
//! schedules while running can itself fall due within the same advance.
//!
//! # Invariants
//!
//! 1. Tasks come out in deadline order; equal deadlines keep scheduling
//!    (FIFO) order.
//! 2. The clock never moves backwards.
//! 3. A cancelled task is never returned.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Virtual-clock task queue.
#[derive(Debug, Clone)]
pub struct Timeline<T> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), T>,
    deadlines: BTreeMap<u64, Duration>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timeline<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
            deadlines: BTreeMap::new(),
        }
    }

    /// Current virtual time.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule `task` to fall due `delay` from now.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let deadline = self.now.saturating_add(delay);
        self.queue.insert((deadline, seq), task);
        self.deadlines.insert(seq, deadline);
        tracing::trace!(task = seq, ?deadline, "timeline schedule");
        TaskId(seq)
    }

    /// Remove a pending task.
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let deadline = self.deadlines.remove(&id.0)?;
        self.queue.remove(&(deadline, id.0))
    }

    /// Remove every pending task for which `pred` holds, in deadline order.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        let keys: Vec<(Duration, u64)> = self
            .queue
            .iter()
            .filter(|(_, task)| pred(task))
            .map(|(key, _)| *key)
            .collect();
        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            self.deadlines.remove(&key.1);
            if let Some(task) = self.queue.remove(&key) {
                removed.push(task);
            }
        }
        removed
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest task if it is due at or before `limit`, moving the
    /// clock to its deadline.
    pub fn pop_due(&mut self, limit: Duration) -> Option<(TaskId, T)> {
        let (&(deadline, seq), _) = self.queue.first_key_value()?;
        if deadline > limit {
            return None;
        }
        let task = self.queue.remove(&(deadline, seq))?;
        self.deadlines.remove(&seq);
        self.now = self.now.max(deadline);
        Some((TaskId(seq), task))
    }

    /// Move the clock forward to `time` (never backwards).
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    /// Pending tasks with their deadlines, earliest first.
    pub fn pending(&self) -> impl Iterator<Item = (Duration, &T)> {
        self.queue.iter().map(|((deadline, _), task)| (*deadline, task))
    }
}
