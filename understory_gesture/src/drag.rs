// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag recognition.
//!
//! ## Overview
//!
//! [`DragGestureRecognizer`] tracks every allowed pointer independently. While
//! a pointer's arena is undecided its movement is accumulated; once the
//! accumulated distance exceeds the slop the recognizer claims the pointer.
//! The slop is the hit slop (see [`compute_hit_slop`](crate::compute_hit_slop))
//! unless the recognizer is built with [`DragSlop::Pan`], which waits for the
//! larger pan slop (see [`compute_pan_slop`](crate::compute_pan_slop)).
//!
//! When the arena is won, the `on_start` factory is called with the global
//! position of the pointer's down event and may return a [`DragTarget`]. The
//! target first receives the movement accumulated so far, then every further
//! movement live, and finally [`end`](DragTarget::end) with the release
//! velocity or [`cancel`](DragTarget::cancel).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use kurbo::{Point, Vec2};
use understory_pointer::{Buttons, PointerChange, PointerEvent, PointerId, PointerKind};

use crate::arena::{GestureArenaEntry, GestureDisposition};
use crate::constants::{MAX_FLING_VELOCITY, MIN_FLING_VELOCITY};
use crate::error::GestureResult;
use crate::recognizer::{
    ArenaMember, GestureContext, GestureFilter, GestureRecognizer, PointerEventSink, RecognizerId,
    invoke_callback,
};
use crate::settings::{DeviceGestureSettings, compute_hit_slop, compute_pan_slop};
use crate::velocity::{Velocity, VelocityTracker};

/// One step of a drag.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragDetails {
    /// Pointer position in global coordinates.
    pub global_position: Point,
    /// Pointer position in the coordinates of the target that added the pointer.
    pub local_position: Point,
    /// Movement since the previous update, in global coordinates.
    pub delta: Vec2,
    /// Release velocity; zero for updates and for releases slower than
    /// [`MIN_FLING_VELOCITY`].
    pub velocity: Velocity,
    /// Time stamp of the event that caused this update, if any.
    pub source_time_stamp: Option<Duration>,
    /// Kind of the pointer.
    pub kind: PointerKind,
}

/// Receives the updates of one started drag.
pub trait DragTarget {
    /// The pointer moved.
    fn update(&mut self, details: &DragDetails) -> GestureResult;

    /// The pointer was released; `details.velocity` holds the release velocity.
    fn end(&mut self, details: &DragDetails) -> GestureResult;

    /// The drag ended without completing.
    fn cancel(&mut self) -> GestureResult;
}

/// Distance a pointer must travel before a [`DragGestureRecognizer`] claims it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DragSlop {
    /// [`compute_hit_slop`]: a drag starts as soon as a press stops being a tap.
    #[default]
    Hit,
    /// [`compute_pan_slop`]: for drags that should lose to nearby hit-slop drags.
    Pan,
}

impl DragSlop {
    fn distance(self, kind: PointerKind, settings: &DeviceGestureSettings) -> f64 {
        match self {
            Self::Hit => compute_hit_slop(kind, settings),
            Self::Pan => compute_pan_slop(kind, settings),
        }
    }
}

/// Creates a [`DragTarget`] for a drag starting at a global position.
pub type DragStartCallback = Box<dyn FnMut(Point) -> Option<Box<dyn DragTarget>>>;

/// Per-pointer state of a [`DragGestureRecognizer`].
pub struct DragPointerState {
    initial_position: Point,
    initial_local_position: Point,
    kind: PointerKind,
    velocity_tracker: VelocityTracker,
    pending_delta: Option<Vec2>,
    last_pending_event_time_stamp: Option<Duration>,
    entry: Option<GestureArenaEntry<RecognizerId>>,
    target: Option<Box<dyn DragTarget>>,
    last_position: (Point, Point),
}

impl fmt::Debug for DragPointerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragPointerState")
            .field("initial_position", &self.initial_position)
            .field("kind", &self.kind)
            .field("pending_delta", &self.pending_delta)
            .field("started", &self.target.is_some())
            .finish_non_exhaustive()
    }
}

impl DragPointerState {
    fn new(event: &PointerEvent) -> Self {
        Self {
            initial_position: event.position,
            initial_local_position: event.local_position,
            kind: event.kind,
            velocity_tracker: VelocityTracker::new(event.kind),
            pending_delta: Some(Vec2::ZERO),
            last_pending_event_time_stamp: None,
            entry: None,
            target: None,
            last_position: (event.position, event.local_position),
        }
    }

    /// Global position of the pointer's down event.
    pub fn initial_position(&self) -> Point {
        self.initial_position
    }

    /// Movement accumulated while the arena is undecided.
    pub fn pending_delta(&self) -> Option<Vec2> {
        self.pending_delta
    }

    /// Whether a drag target is receiving updates.
    pub fn is_started(&self) -> bool {
        self.target.is_some()
    }

    fn resolve(&mut self, cx: &mut GestureContext<'_>, disposition: GestureDisposition) {
        if let Some(entry) = self.entry.take() {
            cx.resolve(entry, disposition);
        }
    }

    fn moved(
        &mut self,
        cx: &mut GestureContext<'_>,
        event: &PointerEvent,
        slop: DragSlop,
    ) -> GestureResult {
        self.velocity_tracker.add_position(event.time_stamp, event.position);
        self.last_position = (event.position, event.local_position);
        if let Some(target) = &mut self.target {
            let details = DragDetails {
                global_position: event.position,
                local_position: event.local_position,
                delta: event.delta,
                velocity: Velocity::ZERO,
                source_time_stamp: Some(event.time_stamp),
                kind: self.kind,
            };
            return invoke_callback("update", || target.update(&details));
        }
        let pending = self.pending_delta.unwrap_or(Vec2::ZERO) + event.delta;
        self.pending_delta = Some(pending);
        self.last_pending_event_time_stamp = Some(event.time_stamp);
        if self.entry.is_some() && pending.hypot() > slop.distance(self.kind, cx.settings()) {
            tracing::trace!(
                pointer = %event.pointer,
                distance = pending.hypot(),
                "drag slop exceeded"
            );
            self.resolve(cx, GestureDisposition::Accepted);
        }
        Ok(())
    }

    fn start(&mut self, target: Box<dyn DragTarget>) -> GestureResult {
        let target = self.target.insert(target);
        let details = DragDetails {
            global_position: self.initial_position,
            local_position: self.initial_local_position,
            delta: self.pending_delta.take().unwrap_or(Vec2::ZERO),
            velocity: Velocity::ZERO,
            source_time_stamp: self.last_pending_event_time_stamp.take(),
            kind: self.kind,
        };
        invoke_callback("update", || target.update(&details))
    }

    /// Finish a started drag. A pending entry is left for the caller to reject.
    fn up(&mut self) -> GestureResult {
        let Some(mut target) = self.target.take() else {
            return Ok(());
        };
        let (global_position, local_position) = self.last_position;
        let details = DragDetails {
            global_position,
            local_position,
            delta: Vec2::ZERO,
            velocity: fling_velocity(self.velocity_tracker.velocity()),
            source_time_stamp: None,
            kind: self.kind,
        };
        invoke_callback("end", || target.end(&details))
    }

    fn cancel(&mut self, cx: &mut GestureContext<'_>) -> GestureResult {
        self.resolve(cx, GestureDisposition::Rejected);
        match self.target.take() {
            Some(mut target) => invoke_callback("cancel", || target.cancel()),
            None => Ok(()),
        }
    }

    fn rejected(&mut self) {
        debug_assert!(self.target.is_none(), "a started drag lost its arena");
        self.pending_delta = None;
        self.last_pending_event_time_stamp = None;
        self.entry = None;
    }
}

fn fling_velocity(velocity: Velocity) -> Velocity {
    if velocity.pixels_per_second.hypot() < MIN_FLING_VELOCITY {
        Velocity::ZERO
    } else {
        velocity.clamp_magnitude(MIN_FLING_VELOCITY, MAX_FLING_VELOCITY)
    }
}

/// Recognizes drags, one per pointer, claiming a pointer as soon as it moves
/// past the hit slop.
pub struct DragGestureRecognizer {
    filter: GestureFilter,
    slop: DragSlop,
    on_start: Option<DragStartCallback>,
    pointers: Vec<(PointerId, DragPointerState)>,
}

impl fmt::Debug for DragGestureRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragGestureRecognizer")
            .field("filter", &self.filter)
            .field("slop", &self.slop)
            .field("pointers", &self.pointers)
            .finish_non_exhaustive()
    }
}

impl Default for DragGestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DragGestureRecognizer {
    /// Create a recognizer that only considers the primary button.
    pub fn new() -> Self {
        Self {
            filter: GestureFilter::default().with_allowed_buttons(Buttons::PRIMARY),
            slop: DragSlop::Hit,
            on_start: None,
            pointers: Vec::new(),
        }
    }

    /// Restrict the device kinds and buttons considered.
    pub fn with_filter(mut self, filter: GestureFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Choose how far a pointer must move before the drag claims it.
    pub fn with_slop(mut self, slop: DragSlop) -> Self {
        self.slop = slop;
        self
    }

    /// Set the factory called when a drag starts.
    pub fn on_start(
        mut self,
        f: impl FnMut(Point) -> Option<Box<dyn DragTarget>> + 'static,
    ) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// State of `pointer`, if it is being tracked.
    pub fn pointer_state(&self, pointer: PointerId) -> Option<&DragPointerState> {
        self.pointers
            .iter()
            .find(|(p, _)| *p == pointer)
            .map(|(_, s)| s)
    }

    /// Number of pointers being tracked.
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    fn state_mut(&mut self, pointer: PointerId) -> Option<&mut DragPointerState> {
        self.pointers
            .iter_mut()
            .find(|(p, _)| *p == pointer)
            .map(|(_, s)| s)
    }

    fn remove_state(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) {
        let Some(index) = self.pointers.iter().position(|(p, _)| *p == pointer) else {
            return;
        };
        cx.remove_route(pointer);
        let (_, mut state) = self.pointers.remove(index);
        state.resolve(cx, GestureDisposition::Rejected);
    }

    fn start_drag(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> GestureResult {
        let Some(initial_position) = self.pointer_state(pointer).map(|s| s.initial_position) else {
            return Ok(());
        };
        let target = self.on_start.as_mut().and_then(|f| f(initial_position));
        let Some(target) = target else {
            tracing::debug!(pointer = %pointer, "drag start declined");
            self.remove_state(cx, pointer);
            return Ok(());
        };
        match self.state_mut(pointer) {
            Some(state) => state.start(target),
            None => Ok(()),
        }
    }
}

impl ArenaMember for DragGestureRecognizer {
    fn accept_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> GestureResult {
        let Some(state) = self.state_mut(pointer) else {
            return Ok(());
        };
        state.entry = None;
        self.start_drag(cx, pointer)
    }

    fn reject_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> GestureResult {
        if let Some(state) = self.state_mut(pointer) {
            state.rejected();
            self.remove_state(cx, pointer);
        }
        Ok(())
    }
}

impl PointerEventSink for DragGestureRecognizer {
    fn handle_event(&mut self, cx: &mut GestureContext<'_>, event: &PointerEvent) -> GestureResult {
        let pointer = event.pointer;
        let slop = self.slop;
        let Some(state) = self.state_mut(pointer) else {
            return Ok(());
        };
        match event.change {
            PointerChange::Move => state.moved(cx, event, slop),
            PointerChange::Up => {
                let result = state.up();
                self.remove_state(cx, pointer);
                result
            }
            PointerChange::Cancel => {
                let result = state.cancel(cx);
                self.remove_state(cx, pointer);
                result
            }
            _ => Ok(()),
        }
    }
}

impl GestureRecognizer for DragGestureRecognizer {
    fn filter(&self) -> &GestureFilter {
        &self.filter
    }

    fn add_allowed_pointer(
        &mut self,
        cx: &mut GestureContext<'_>,
        event: &PointerEvent,
    ) -> GestureResult {
        assert!(
            self.pointer_state(event.pointer).is_none(),
            "pointer {} is already tracked by {}",
            event.pointer,
            cx.id()
        );
        let mut state = DragPointerState::new(event);
        cx.add_route(event.pointer, event.transform);
        state.entry = Some(cx.join_arena(event.pointer));
        self.pointers.push((event.pointer, state));
        Ok(())
    }

    fn dispose(&mut self, cx: &mut GestureContext<'_>) {
        let pointers: Vec<PointerId> = self.pointers.iter().map(|(p, _)| *p).collect();
        for pointer in pointers {
            self.remove_state(cx, pointer);
        }
    }

    fn debug_description(&self) -> &'static str {
        "drag"
    }
}
