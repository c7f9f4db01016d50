// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The gesture host: recognizers, routes, arenas and deferred work in one place.
//!
//! ## Overview
//!
//! [`Gestures`] owns every registered recognizer together with the
//! [`PointerRouter`], the [`GestureArenaManager`] and the [`Scheduler`] they
//! talk to. Each host operation runs to completion, then delivers the arena
//! notifications it produced in order, so a recognizer is never re-entered
//! while it is handling a call.
//!
//! ```
//! use core::time::Duration;
//! use kurbo::Point;
//! use understory_gesture::{Gestures, TapGestureRecognizer};
//! use understory_pointer::{Buttons, PointerChange, PointerEvent, PointerId, PointerKind};
//!
//! let mut gestures = Gestures::new();
//! let tap = gestures.register(TapGestureRecognizer::new().on_tap(|| Ok(())));
//!
//! let down = PointerEvent::new(PointerId(1), PointerChange::Down, Point::new(5.0, 5.0))
//!     .with_kind(PointerKind::Touch)
//!     .with_buttons(Buttons::PRIMARY);
//! gestures.add_pointer(tap, &down).unwrap();
//! gestures.handle_event(&down);
//! // The only member of the arena wins on the next microtask.
//! gestures.flush();
//! assert!(!gestures.arena().has_arena(PointerId(1)));
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::time::Duration;

use understory_pointer::{PointerChange, PointerEvent, PointerId};
use understory_responder::PointerRouter;

use crate::arena::{ArenaDecision, GestureArenaManager, GestureDisposition};
use crate::error::{GestureError, GestureResult};
use crate::recognizer::{GestureContext, GestureRecognizer, RecognizerId};
use crate::scheduler::{GestureTask, Scheduler, TaskQueue};
use crate::settings::DeviceGestureSettings;

struct Slot {
    generation: u32,
    recognizer: Option<Box<dyn GestureRecognizer>>,
}

struct Core {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    arena: GestureArenaManager<RecognizerId>,
    scheduler: Box<dyn Scheduler<GestureTask>>,
    settings: DeviceGestureSettings,
}

/// Owns recognizers and runs gesture arbitration for them.
pub struct Gestures {
    router: PointerRouter<RecognizerId>,
    core: Core,
}

impl fmt::Debug for Gestures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let live = self
            .core
            .slots
            .iter()
            .filter(|s| s.recognizer.is_some())
            .count();
        f.debug_struct("Gestures")
            .field("recognizers", &live)
            .field("router", &self.router)
            .field("arena", &self.core.arena)
            .field("now", &self.core.scheduler.now())
            .field("settings", &self.core.settings)
            .finish_non_exhaustive()
    }
}

impl Default for Gestures {
    fn default() -> Self {
        Self::with_scheduler(Box::new(TaskQueue::new()))
    }
}

impl Gestures {
    /// Create a host driven by a virtual-clock [`TaskQueue`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host driven by `scheduler`.
    pub fn with_scheduler(scheduler: Box<dyn Scheduler<GestureTask>>) -> Self {
        Self {
            router: PointerRouter::new(),
            core: Core {
                slots: Vec::new(),
                free_list: Vec::new(),
                arena: GestureArenaManager::new(),
                scheduler,
                settings: DeviceGestureSettings::default(),
            },
        }
    }

    /// Use `settings` for every recognizer.
    pub fn with_settings(mut self, settings: DeviceGestureSettings) -> Self {
        self.core.settings = settings;
        self
    }

    /// Gesture settings handed to recognizers.
    pub fn settings(&self) -> &DeviceGestureSettings {
        &self.core.settings
    }

    /// Replace the gesture settings.
    pub fn set_settings(&mut self, settings: DeviceGestureSettings) {
        self.core.settings = settings;
    }

    /// The arena manager, for inspection.
    pub fn arena(&self) -> &GestureArenaManager<RecognizerId> {
        &self.core.arena
    }

    /// The pointer router, for inspection.
    pub fn router(&self) -> &PointerRouter<RecognizerId> {
        &self.router
    }

    /// Current time of the scheduler.
    pub fn now(&self) -> Duration {
        self.core.scheduler.now()
    }

    /// Register a recognizer.
    pub fn register<R: GestureRecognizer>(&mut self, recognizer: R) -> RecognizerId {
        let recognizer: Box<dyn GestureRecognizer> = Box::new(recognizer);
        let slots = &mut self.core.slots;
        let (idx, generation) = if let Some(idx) = self.core.free_list.pop() {
            let slot = &mut slots[idx];
            slot.generation += 1;
            slot.recognizer = Some(recognizer);
            (idx, slot.generation)
        } else {
            slots.push(Slot {
                generation: 1,
                recognizer: Some(recognizer),
            });
            (slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "RecognizerId uses 32-bit indices by design."
        )]
        let id = RecognizerId::new(idx as u32, generation);
        tracing::debug!(recognizer = %id, "recognizer registered");
        id
    }

    /// Whether `id` refers to a registered recognizer.
    pub fn is_alive(&self, id: RecognizerId) -> bool {
        self.core.slot(id).is_some()
    }

    /// Dispose a recognizer: its outstanding arena entries are rejected and
    /// its routes removed. Disposing twice is a no-op.
    pub fn dispose(&mut self, id: RecognizerId) {
        if !self.is_alive(id) {
            return;
        }
        let _ = self.core.with_recognizer(&mut self.router, id, |r, cx| {
            r.dispose(cx);
            Ok(())
        });
        if let Some(slot) = self.core.slots.get_mut(id.idx()) {
            slot.recognizer = None;
            self.core.free_list.push(id.idx());
        }
        tracing::debug!(recognizer = %id, "recognizer disposed");
        self.core.drain_decisions(&mut self.router);
    }

    /// The recognizer `id`, if it is registered and of type `T`.
    pub fn recognizer<T: GestureRecognizer>(&self, id: RecognizerId) -> Option<&T> {
        let recognizer: &dyn Any = self.core.slot(id)?;
        recognizer.downcast_ref()
    }

    /// The recognizer `id`, mutably, if it is registered and of type `T`.
    pub fn recognizer_mut<T: GestureRecognizer>(&mut self, id: RecognizerId) -> Option<&mut T> {
        let recognizer: &mut dyn Any = self
            .core
            .slots
            .get_mut(id.idx())
            .filter(|s| s.generation == id.generation())?
            .recognizer
            .as_deref_mut()?;
        recognizer.downcast_mut()
    }

    /// Offer a new pointer to a recognizer, usually from a hit-test target
    /// handling the pointer's down event.
    pub fn add_pointer(&mut self, id: RecognizerId, event: &PointerEvent) -> GestureResult {
        let result = self
            .core
            .with_recognizer(&mut self.router, id, |r, cx| r.add_pointer(cx, event));
        self.core.drain_decisions(&mut self.router);
        result
    }

    /// Deliver `event` to the recognizers tracking its pointer.
    ///
    /// Recognizer failures are logged and do not stop delivery.
    pub fn route(&mut self, event: &PointerEvent) {
        let Self { router, core } = self;
        router.route(event, |router, id, event| {
            let result = core.with_recognizer(router, id, |r, cx| r.handle_event(cx, event));
            core.drain_decisions(router);
            result
        });
    }

    /// Route `event`, then close the pointer's arena on down or sweep it on up.
    pub fn handle_event(&mut self, event: &PointerEvent) {
        self.route(event);
        match event.change {
            PointerChange::Down => self.close_arena(event.pointer),
            PointerChange::Up => self.sweep_arena(event.pointer),
            _ => {}
        }
    }

    /// Close the arena for `pointer`.
    pub fn close_arena(&mut self, pointer: PointerId) {
        self.core.arena.close(pointer, self.core.scheduler.as_mut());
        self.core.drain_decisions(&mut self.router);
    }

    /// Sweep the arena for `pointer`.
    pub fn sweep_arena(&mut self, pointer: PointerId) {
        self.core.arena.sweep(pointer);
        self.core.drain_decisions(&mut self.router);
    }

    /// Hold the arena for `pointer`, deferring its sweep.
    pub fn hold_arena(&mut self, pointer: PointerId) {
        self.core.arena.hold(pointer);
    }

    /// Release the arena for `pointer`, running a deferred sweep.
    pub fn release_arena(&mut self, pointer: PointerId) {
        self.core.arena.release(pointer);
        self.core.drain_decisions(&mut self.router);
    }

    /// Move the clock forward and run everything that became due.
    pub fn advance_to(&mut self, now: Duration) {
        self.core.scheduler.advance_to(now);
        self.flush();
    }

    /// Run pending microtasks and due timers.
    pub fn flush(&mut self) {
        self.core.run_ready_tasks(&mut self.router);
    }
}

impl Core {
    fn slot(&self, id: RecognizerId) -> Option<&dyn GestureRecognizer> {
        self.slots
            .get(id.idx())
            .filter(|s| s.generation == id.generation())?
            .recognizer
            .as_deref()
    }

    fn with_recognizer<F>(
        &mut self,
        router: &mut PointerRouter<RecognizerId>,
        id: RecognizerId,
        f: F,
    ) -> GestureResult
    where
        F: FnOnce(&mut dyn GestureRecognizer, &mut GestureContext<'_>) -> GestureResult,
    {
        let Some(recognizer) = self
            .slots
            .get_mut(id.idx())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.recognizer.as_deref_mut())
        else {
            return Err(GestureError::UnknownRecognizer(id));
        };
        let mut cx = GestureContext::new(
            id,
            router,
            &mut self.arena,
            self.scheduler.as_mut(),
            &self.settings,
        );
        f(recognizer, &mut cx)
    }

    fn drain_decisions(&mut self, router: &mut PointerRouter<RecognizerId>) {
        while let Some(decision) = self.arena.take_decision() {
            let ArenaDecision {
                pointer,
                member,
                disposition,
            } = decision;
            if self.slot(member).is_none() {
                tracing::trace!(
                    pointer = %pointer,
                    member = %member,
                    "decision for disposed recognizer dropped"
                );
                continue;
            }
            let result = self.with_recognizer(router, member, |r, cx| match disposition {
                GestureDisposition::Accepted => r.accept_gesture(cx, pointer),
                GestureDisposition::Rejected => r.reject_gesture(cx, pointer),
            });
            if let Err(err) = result {
                tracing::warn!(
                    pointer = %pointer,
                    member = %member,
                    error = %err,
                    "arena notification failed"
                );
            }
        }
    }

    fn run_ready_tasks(&mut self, router: &mut PointerRouter<RecognizerId>) {
        loop {
            self.drain_decisions(router);
            let Some(task) = self.scheduler.pop_ready() else {
                break;
            };
            match task {
                GestureTask::ResolveArena(pointer) => self.arena.resolve_by_default(pointer),
                GestureTask::Deadline {
                    recognizer,
                    pointer,
                } => {
                    if self.slot(recognizer).is_none() {
                        continue;
                    }
                    let result = self.with_recognizer(router, recognizer, |r, cx| {
                        r.did_exceed_deadline(cx, pointer)
                    });
                    if let Err(err) = result {
                        tracing::warn!(
                            pointer = %pointer,
                            member = %recognizer,
                            error = %err,
                            "deadline handler failed"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{ArenaMember, GestureFilter, PointerEventSink, PointerTracker};
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use kurbo::Point;

    type Log = Rc<RefCell<Vec<(char, &'static str, PointerId)>>>;

    /// Records every call and tracks pointers with a [`PointerTracker`].
    struct Probe {
        name: char,
        log: Log,
        tracker: PointerTracker,
        filter: GestureFilter,
        accept_on_move: bool,
    }

    impl Probe {
        fn new(name: char, log: &Log) -> Self {
            Self {
                name,
                log: log.clone(),
                tracker: PointerTracker::new(),
                filter: GestureFilter::default(),
                accept_on_move: false,
            }
        }

        fn record(&self, what: &'static str, pointer: PointerId) {
            self.log.borrow_mut().push((self.name, what, pointer));
        }
    }

    impl ArenaMember for Probe {
        fn accept_gesture(
            &mut self,
            _: &mut GestureContext<'_>,
            pointer: PointerId,
        ) -> GestureResult {
            self.tracker.forget_entry(pointer);
            self.record("accept", pointer);
            Ok(())
        }

        fn reject_gesture(
            &mut self,
            _: &mut GestureContext<'_>,
            pointer: PointerId,
        ) -> GestureResult {
            self.tracker.forget_entry(pointer);
            self.record("reject", pointer);
            Ok(())
        }
    }

    impl PointerEventSink for Probe {
        fn handle_event(
            &mut self,
            cx: &mut GestureContext<'_>,
            event: &PointerEvent,
        ) -> GestureResult {
            self.record("event", event.pointer);
            if self.accept_on_move && event.change == PointerChange::Move {
                self.tracker
                    .resolve_pointer(cx, event.pointer, GestureDisposition::Accepted);
            }
            self.tracker.stop_tracking_if_pointer_no_longer_down(cx, event);
            if event.change == PointerChange::Cancel {
                return Err(GestureError::callback("probe", "cancelled"));
            }
            Ok(())
        }
    }

    impl GestureRecognizer for Probe {
        fn filter(&self) -> &GestureFilter {
            &self.filter
        }

        fn add_allowed_pointer(
            &mut self,
            cx: &mut GestureContext<'_>,
            event: &PointerEvent,
        ) -> GestureResult {
            self.tracker.start_tracking(cx, event.pointer, event.transform);
            Ok(())
        }

        fn dispose(&mut self, cx: &mut GestureContext<'_>) {
            self.tracker.dispose(cx);
        }

        fn debug_description(&self) -> &'static str {
            "probe"
        }
    }

    const P: PointerId = PointerId(1);

    fn ev(change: PointerChange) -> PointerEvent {
        PointerEvent::new(P, change, Point::ZERO)
    }

    #[test]
    fn tracked_pointer_is_routed_and_swept() {
        let log = Log::default();
        let mut g = Gestures::new();
        let a = g.register(Probe::new('a', &log));
        let b = g.register(Probe::new('b', &log));
        g.add_pointer(a, &ev(PointerChange::Down)).unwrap();
        g.add_pointer(b, &ev(PointerChange::Down)).unwrap();
        g.handle_event(&ev(PointerChange::Down));
        g.handle_event(&ev(PointerChange::Up));
        assert_eq!(
            *log.borrow(),
            [
                ('a', "event", P),
                ('b', "event", P),
                ('a', "event", P),
                ('b', "event", P),
                ('b', "reject", P),
                ('a', "accept", P),
            ]
        );
        assert!(g.router().is_empty());
    }

    #[test]
    fn sole_member_wins_on_flush() {
        let log = Log::default();
        let mut g = Gestures::new();
        let a = g.register(Probe::new('a', &log));
        g.add_pointer(a, &ev(PointerChange::Down)).unwrap();
        g.handle_event(&ev(PointerChange::Down));
        assert_eq!(log.borrow().len(), 1);
        g.flush();
        assert_eq!(log.borrow().last(), Some(&('a', "accept", P)));
    }

    #[test]
    fn eager_accept_during_routing_rejects_the_rest_immediately() {
        let log = Log::default();
        let mut g = Gestures::new();
        let a = g.register(Probe::new('a', &log));
        let mut eager = Probe::new('b', &log);
        eager.accept_on_move = true;
        let b = g.register(eager);
        let c = g.register(Probe::new('c', &log));
        for id in [a, b, c] {
            g.add_pointer(id, &ev(PointerChange::Down)).unwrap();
        }
        g.close_arena(P);
        log.borrow_mut().clear();
        g.route(&ev(PointerChange::Move));
        assert_eq!(
            *log.borrow(),
            [
                ('a', "event", P),
                ('b', "event", P),
                ('a', "reject", P),
                ('c', "reject", P),
                ('b', "accept", P),
                ('c', "event", P),
            ]
        );
    }

    #[test]
    fn handler_errors_do_not_stop_routing() {
        let log = Log::default();
        let mut g = Gestures::new();
        let a = g.register(Probe::new('a', &log));
        let b = g.register(Probe::new('b', &log));
        g.add_pointer(a, &ev(PointerChange::Down)).unwrap();
        g.add_pointer(b, &ev(PointerChange::Down)).unwrap();
        g.route(&ev(PointerChange::Cancel));
        assert_eq!(log.borrow().iter().filter(|e| e.1 == "event").count(), 2);
    }

    #[test]
    fn dispose_rejects_and_is_idempotent() {
        let log = Log::default();
        let mut g = Gestures::new();
        let a = g.register(Probe::new('a', &log));
        let b = g.register(Probe::new('b', &log));
        g.add_pointer(a, &ev(PointerChange::Down)).unwrap();
        g.add_pointer(b, &ev(PointerChange::Down)).unwrap();
        g.close_arena(P);
        g.dispose(a);
        g.dispose(a);
        assert!(!g.is_alive(a));
        g.flush();
        // a's own rejection is dropped; b wins by default.
        assert_eq!(*log.borrow(), [('b', "accept", P)]);
        assert_eq!(
            g.add_pointer(a, &ev(PointerChange::Down)),
            Err(GestureError::UnknownRecognizer(a))
        );
    }

    #[test]
    fn slots_are_reused_with_a_new_generation() {
        let log = Log::default();
        let mut g = Gestures::new();
        let a = g.register(Probe::new('a', &log));
        g.dispose(a);
        let b = g.register(Probe::new('b', &log));
        assert_eq!(a.idx(), b.idx());
        assert_ne!(a, b);
        assert!(g.recognizer::<Probe>(a).is_none());
        assert_eq!(g.recognizer::<Probe>(b).map(|p| p.name), Some('b'));
        assert!(g.recognizer_mut::<Probe>(b).is_some());
    }
}
