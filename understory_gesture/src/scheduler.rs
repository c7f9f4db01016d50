// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred work: microtasks and timers.
//!
//! ## Overview
//!
//! Gesture arbitration defers two kinds of work. Default resolution of an arena
//! with a single survivor runs as a microtask (after the current dispatch, before
//! the next event), and primary-pointer recognizers arm a deadline timer. Both go
//! through the [`Scheduler`] trait so an embedder can plug in its event loop.
//!
//! [`TaskQueue`] is the bundled implementation. It keeps a virtual clock that
//! only moves when told to, which makes tests deterministic:
//!
//! ```
//! use core::time::Duration;
//! use understory_gesture::{Scheduler, TaskQueue};
//!
//! let mut q = TaskQueue::new();
//! let late = q.schedule_timer(Duration::from_millis(10), "late");
//! q.schedule_timer(Duration::from_millis(5), "early");
//! q.schedule_microtask("now");
//!
//! assert_eq!(q.pop_ready(), Some("now"));
//! assert_eq!(q.pop_ready(), None);
//! q.advance_to(Duration::from_millis(20));
//! assert_eq!(q.pop_ready(), Some("early"));
//! assert!(q.cancel(late));
//! assert_eq!(q.pop_ready(), None);
//! ```

use alloc::collections::{BTreeMap, VecDeque};
use core::time::Duration;

use understory_pointer::PointerId;

use crate::recognizer::RecognizerId;

/// Cancellation token for a scheduled task.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TaskHandle(u64);

/// Work the gesture host schedules for itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum GestureTask {
    /// Resolve the arena for a pointer in favor of its sole remaining member.
    ResolveArena(PointerId),
    /// A recognizer's deadline for a pointer elapsed.
    Deadline {
        /// Recognizer that armed the deadline.
        recognizer: RecognizerId,
        /// Pointer the deadline was armed for.
        pointer: PointerId,
    },
}

/// A source of time and a queue of deferred tasks.
pub trait Scheduler<T> {
    /// Current time.
    fn now(&self) -> Duration;

    /// Move the clock forward to `now`. Moving backwards is ignored.
    fn advance_to(&mut self, now: Duration);

    /// Run `task` once the current dispatch finishes.
    fn schedule_microtask(&mut self, task: T) -> TaskHandle;

    /// Run `task` once `delay` has elapsed from [`now`](Self::now).
    fn schedule_timer(&mut self, delay: Duration, task: T) -> TaskHandle;

    /// Cancel a pending task. Returns `false` if it already ran or was cancelled.
    fn cancel(&mut self, handle: TaskHandle) -> bool;

    /// Take the next task that is ready to run.
    ///
    /// Microtasks come first, in scheduling order. Then timers whose deadline
    /// has passed, earliest deadline first, ties in scheduling order.
    fn pop_ready(&mut self) -> Option<T>;
}

/// A virtual-clock [`Scheduler`].
#[derive(Clone, Debug)]
pub struct TaskQueue<T> {
    now: Duration,
    next_handle: u64,
    microtasks: VecDeque<(TaskHandle, T)>,
    timers: BTreeMap<(Duration, TaskHandle), T>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            microtasks: VecDeque::new(),
            timers: BTreeMap::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    /// Create an empty queue with the clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline of the earliest pending timer.
    ///
    /// An embedder driving a real event loop arms a platform timer for this
    /// instant and calls [`Scheduler::advance_to`] when it fires.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of pending microtasks and timers.
    pub fn len(&self) -> usize {
        self.microtasks.len() + self.timers.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&mut self) -> TaskHandle {
        self.next_handle += 1;
        TaskHandle(self.next_handle)
    }
}

impl<T> Scheduler<T> for TaskQueue<T> {
    fn now(&self) -> Duration {
        self.now
    }

    fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn schedule_microtask(&mut self, task: T) -> TaskHandle {
        let handle = self.handle();
        self.microtasks.push_back((handle, task));
        handle
    }

    fn schedule_timer(&mut self, delay: Duration, task: T) -> TaskHandle {
        let handle = self.handle();
        self.timers.insert((self.now.saturating_add(delay), handle), task);
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        if let Some(index) = self.microtasks.iter().position(|(h, _)| *h == handle) {
            self.microtasks.remove(index);
            return true;
        }
        let key = self.timers.keys().find(|(_, h)| *h == handle).copied();
        key.is_some_and(|key| self.timers.remove(&key).is_some())
    }

    fn pop_ready(&mut self) -> Option<T> {
        if let Some((_, task)) = self.microtasks.pop_front() {
            return Some(task);
        }
        let (deadline, _) = *self.timers.keys().next()?;
        if deadline > self.now {
            return None;
        }
        self.timers.pop_first().map(|(_, task)| task)
    }
}
