// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::time::Duration;

use kurbo::Point;
use understory_pointer::{PointerChange, PointerEvent, PointerId};

use super::{GestureContext, PointerTracker};
use crate::arena::GestureDisposition;
use crate::constants::TOUCH_SLOP;
use crate::scheduler::TaskHandle;

/// Lifecycle of a primary-pointer recognizer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum GestureRecognizerState {
    /// Not tracking any pointer.
    #[default]
    Ready,
    /// Tracking a primary pointer; the gesture may still be recognized.
    Possible,
    /// The gesture was ruled out; waiting for the tracked pointers to finish.
    Defunct,
}

impl GestureRecognizerState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Ready, Self::Possible)
                | (Self::Possible, Self::Defunct)
                | (Self::Possible | Self::Defunct, Self::Ready)
        )
    }

    /// Whether moving from `self` to `next` is illegal.
    pub fn cannot(self, next: Self) -> bool {
        !self.can(next)
    }
}

/// How a recognizer should treat a routed event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PrimaryStep {
    /// An event of the primary pointer while the gesture is possible.
    Primary,
    /// The primary pointer moved past the slop tolerance; the recognizer
    /// should reject and stop tracking it.
    SlopExceeded,
    /// Anything else.
    Other,
}

/// The primary-pointer state machine shared by tap-like recognizers.
///
/// The first allowed pointer becomes the primary pointer and moves the state
/// from [`Ready`](GestureRecognizerState::Ready) to
/// [`Possible`](GestureRecognizerState::Possible), arming the deadline if one
/// is configured. Moving the primary pointer further than the slop tolerance
/// rules the gesture out. Losing the arena makes the state
/// [`Defunct`](GestureRecognizerState::Defunct). Once the last tracked pointer
/// ends, everything returns to `Ready`.
#[derive(Debug)]
pub struct PrimaryPointerState {
    tracker: PointerTracker,
    state: GestureRecognizerState,
    primary_pointer: Option<PointerId>,
    initial_position: Option<(Point, Point)>,
    accepted: bool,
    timer: Option<TaskHandle>,
    deadline: Option<Duration>,
    pre_accept_slop_tolerance: Option<f64>,
    post_accept_slop_tolerance: Option<f64>,
}

impl PrimaryPointerState {
    /// Create a state machine with an optional deadline and the default slop
    /// tolerances of [`TOUCH_SLOP`].
    pub fn new(deadline: Option<Duration>) -> Self {
        Self {
            tracker: PointerTracker::new(),
            state: GestureRecognizerState::Ready,
            primary_pointer: None,
            initial_position: None,
            accepted: false,
            timer: None,
            deadline,
            pre_accept_slop_tolerance: Some(TOUCH_SLOP),
            post_accept_slop_tolerance: Some(TOUCH_SLOP),
        }
    }

    /// Distance the primary pointer may travel before the arena is won.
    /// `None` disables the check.
    pub fn with_pre_accept_slop_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.pre_accept_slop_tolerance = tolerance;
        self
    }

    /// Distance the primary pointer may travel after the arena is won.
    /// `None` disables the check.
    pub fn with_post_accept_slop_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.post_accept_slop_tolerance = tolerance;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GestureRecognizerState {
        self.state
    }

    /// The primary pointer of the current or most recent gesture.
    pub fn primary_pointer(&self) -> Option<PointerId> {
        self.primary_pointer
    }

    /// Global position of the primary pointer's down event.
    pub fn initial_position(&self) -> Option<Point> {
        self.initial_position.map(|(global, _)| global)
    }

    /// Local position of the primary pointer's down event.
    pub fn initial_local_position(&self) -> Option<Point> {
        self.initial_position.map(|(_, local)| local)
    }

    /// Whether the arena for the primary pointer was won.
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// The underlying tracker.
    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    /// Track `event`'s pointer; the first one becomes the primary pointer.
    pub fn add_allowed_pointer(&mut self, cx: &mut GestureContext<'_>, event: &PointerEvent) {
        self.tracker.start_tracking(cx, event.pointer, event.transform);
        if self.state == GestureRecognizerState::Ready {
            self.transition(GestureRecognizerState::Possible);
            self.primary_pointer = Some(event.pointer);
            self.initial_position = Some((event.position, event.local_position));
            self.accepted = false;
            if let Some(deadline) = self.deadline {
                self.timer = Some(cx.schedule_deadline(deadline, event.pointer));
            }
        }
    }

    /// Reject outstanding entries for a non-allowed pointer, unless the
    /// gesture was already accepted.
    pub fn handle_non_allowed_pointer(&mut self, cx: &mut GestureContext<'_>) {
        if !self.accepted {
            self.tracker.resolve(cx, GestureDisposition::Rejected);
        }
    }

    /// Classify a routed event.
    ///
    /// # Panics
    ///
    /// Panics if no pointer is being tracked.
    pub fn begin_event(&self, event: &PointerEvent) -> PrimaryStep {
        assert!(
            self.state != GestureRecognizerState::Ready,
            "pointer {} routed to a recognizer that is not tracking",
            event.pointer
        );
        if self.state != GestureRecognizerState::Possible
            || self.primary_pointer != Some(event.pointer)
        {
            return PrimaryStep::Other;
        }
        let tolerance = if self.accepted {
            self.post_accept_slop_tolerance
        } else {
            self.pre_accept_slop_tolerance
        };
        let past_tolerance = tolerance.is_some_and(|t| self.global_distance(event) > t);
        if event.change == PointerChange::Move && past_tolerance {
            PrimaryStep::SlopExceeded
        } else {
            PrimaryStep::Primary
        }
    }

    /// Finish handling a routed event: stop tracking a pointer that lifted.
    pub fn end_event(&mut self, cx: &mut GestureContext<'_>, event: &PointerEvent) {
        if self.tracker.stop_tracking_if_pointer_no_longer_down(cx, event) {
            self.did_stop_tracking_last_pointer(cx);
        }
    }

    /// Stop tracking `pointer`, returning to `Ready` if it was the last one.
    pub fn stop_tracking(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) {
        if self.tracker.stop_tracking(cx, pointer) {
            self.did_stop_tracking_last_pointer(cx);
        }
    }

    /// Resolve every outstanding arena entry.
    pub fn resolve(&mut self, cx: &mut GestureContext<'_>, disposition: GestureDisposition) {
        self.tracker.resolve(cx, disposition);
    }

    /// The arena for `pointer` was won. Returns whether it is the primary pointer.
    pub fn accept_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> bool {
        self.tracker.forget_entry(pointer);
        if self.primary_pointer != Some(pointer) {
            return false;
        }
        self.stop_timer(cx);
        self.accepted = true;
        true
    }

    /// The arena for `pointer` was lost. Returns whether it is the primary pointer.
    pub fn reject_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> bool {
        self.tracker.forget_entry(pointer);
        if self.primary_pointer != Some(pointer) {
            return false;
        }
        if self.state == GestureRecognizerState::Possible {
            self.stop_timer(cx);
            self.transition(GestureRecognizerState::Defunct);
        }
        true
    }

    /// The deadline for `pointer` elapsed. Returns `true` if it is still armed
    /// for the current primary pointer.
    pub fn deadline_elapsed(&mut self, pointer: PointerId) -> bool {
        self.primary_pointer == Some(pointer)
            && self.state == GestureRecognizerState::Possible
            && self.timer.take().is_some()
    }

    /// # Panics
    ///
    /// Panics unless the state is [`Possible`](GestureRecognizerState::Possible).
    pub fn assert_possible(&self) {
        assert_eq!(
            self.state,
            GestureRecognizerState::Possible,
            "primary pointer handled while not possible"
        );
    }

    /// Cancel the deadline, reject outstanding entries and remove all routes.
    pub fn dispose(&mut self, cx: &mut GestureContext<'_>) {
        self.stop_timer(cx);
        self.tracker.dispose(cx);
    }

    fn did_stop_tracking_last_pointer(&mut self, cx: &mut GestureContext<'_>) {
        self.stop_timer(cx);
        self.transition(GestureRecognizerState::Ready);
        self.initial_position = None;
        self.accepted = false;
    }

    fn stop_timer(&mut self, cx: &mut GestureContext<'_>) {
        if let Some(timer) = self.timer.take() {
            cx.cancel_task(timer);
        }
    }

    fn transition(&mut self, next: GestureRecognizerState) {
        assert!(
            !self.state.cannot(next),
            "illegal recognizer transition {:?} -> {next:?}",
            self.state
        );
        self.state = next;
    }

    fn global_distance(&self, event: &PointerEvent) -> f64 {
        self.initial_position
            .map_or(0.0, |(global, _)| (event.position - global).hypot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::test_support::Harness;
    use crate::scheduler::{GestureTask, Scheduler};

    const P: PointerId = PointerId(3);

    fn event(change: PointerChange, x: f64) -> PointerEvent {
        PointerEvent::new(P, change, Point::new(x, 0.0))
    }

    #[test]
    fn transitions() {
        use GestureRecognizerState as S;
        assert!(S::Ready.can(S::Possible));
        assert!(S::Ready.cannot(S::Defunct));
        assert!(S::Defunct.cannot(S::Possible));
        assert!(S::Defunct.can(S::Ready));
    }

    #[test]
    fn first_pointer_becomes_primary_and_arms_deadline() {
        let mut h = Harness::default();
        let mut s = PrimaryPointerState::new(Some(Duration::from_millis(100)));
        s.add_allowed_pointer(&mut h.cx(), &event(PointerChange::Down, 0.0));
        assert_eq!(s.state(), GestureRecognizerState::Possible);
        assert_eq!(s.primary_pointer(), Some(P));
        h.queue.advance_to(Duration::from_millis(100));
        assert!(matches!(
            h.queue.pop_ready(),
            Some(GestureTask::Deadline { pointer: P, .. })
        ));
        assert!(s.deadline_elapsed(P));
        assert!(!s.deadline_elapsed(P));
    }

    #[test]
    fn slop_only_applies_to_moves_of_the_primary_pointer() {
        let mut h = Harness::default();
        let mut s = PrimaryPointerState::new(None);
        s.add_allowed_pointer(&mut h.cx(), &event(PointerChange::Down, 0.0));
        assert_eq!(s.begin_event(&event(PointerChange::Move, 18.0)), PrimaryStep::Primary);
        assert_eq!(
            s.begin_event(&event(PointerChange::Move, 18.5)),
            PrimaryStep::SlopExceeded
        );
        assert_eq!(s.begin_event(&event(PointerChange::Up, 50.0)), PrimaryStep::Primary);
        let other = PointerEvent::new(PointerId(9), PointerChange::Move, Point::new(90.0, 0.0));
        assert_eq!(s.begin_event(&other), PrimaryStep::Other);
    }

    #[test]
    fn acceptance_cancels_deadline_and_switches_tolerance() {
        let mut h = Harness::default();
        let mut s = PrimaryPointerState::new(Some(Duration::from_millis(100)))
            .with_post_accept_slop_tolerance(None);
        s.add_allowed_pointer(&mut h.cx(), &event(PointerChange::Down, 0.0));
        assert!(s.accept_gesture(&mut h.cx(), P));
        assert!(s.is_accepted());
        assert!(h.queue.is_empty());
        assert_eq!(s.begin_event(&event(PointerChange::Move, 500.0)), PrimaryStep::Primary);
    }

    #[test]
    fn rejection_makes_gesture_defunct_until_up() {
        let mut h = Harness::default();
        let mut s = PrimaryPointerState::new(None);
        s.add_allowed_pointer(&mut h.cx(), &event(PointerChange::Down, 0.0));
        assert!(s.reject_gesture(&mut h.cx(), P));
        assert_eq!(s.state(), GestureRecognizerState::Defunct);
        let up = event(PointerChange::Up, 0.0);
        assert_eq!(s.begin_event(&up), PrimaryStep::Other);
        s.end_event(&mut h.cx(), &up);
        assert_eq!(s.state(), GestureRecognizerState::Ready);
        assert!(h.router.is_empty());
    }

    #[test]
    fn non_allowed_pointer_rejects_only_before_acceptance() {
        let mut h = Harness::default();
        let mut s = PrimaryPointerState::new(None);
        s.add_allowed_pointer(&mut h.cx(), &event(PointerChange::Down, 0.0));
        s.handle_non_allowed_pointer(&mut h.cx());
        assert!(h.arena.take_decision().is_some());
        assert!(!s.tracker().has_entry(P));
    }

    #[test]
    #[should_panic(expected = "not possible")]
    fn primary_handling_requires_possible() {
        PrimaryPointerState::new(None).assert_possible();
    }
}
