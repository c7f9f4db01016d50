// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recognizer capabilities and the context they run in.
//!
//! ## Overview
//!
//! A recognizer is a state machine registered with the [`Gestures`](crate::Gestures)
//! host. It is told about new pointers through
//! [`add_pointer`](GestureRecognizer::add_pointer), receives the pointer's
//! subsequent events as a [`PointerEventSink`], and learns the outcome of
//! arbitration as an [`ArenaMember`].
//!
//! Recognizers never hold references to the host. Every call receives a
//! [`GestureContext`] through which they join arenas, resolve entries,
//! register routes and arm deadlines. The host delivers arena notifications
//! once the call that produced them returns.
//!
//! Shared behavior is composed rather than inherited: [`PointerTracker`]
//! manages routes and arena entries for every tracked pointer, and
//! [`PrimaryPointerState`] adds the primary-pointer state machine used by
//! [`TapGestureRecognizer`](crate::TapGestureRecognizer).

mod primary_pointer;
mod tracker;

use core::any::Any;
use core::fmt;
use core::time::Duration;

use kurbo::Affine;
use understory_pointer::{Buttons, DeviceKinds, PointerEvent, PointerId};
use understory_responder::PointerRouter;

use crate::arena::{GestureArenaEntry, GestureArenaManager, GestureDisposition};
use crate::error::GestureResult;
use crate::scheduler::{GestureTask, Scheduler, TaskHandle};
use crate::settings::DeviceGestureSettings;

pub use primary_pointer::{GestureRecognizerState, PrimaryPointerState, PrimaryStep};
pub use tracker::PointerTracker;

/// Handle to a recognizer registered with a [`Gestures`](crate::Gestures) host.
///
/// A slot index and a generation counter. A fresh slot starts at generation
/// `1`; disposing a recognizer frees its slot, and reusing the slot bumps the
/// generation so stale handles never alias a new recognizer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RecognizerId(pub(crate) u32, pub(crate) u32);

impl RecognizerId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Display for RecognizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.0, self.1)
    }
}

/// Which pointers a recognizer is willing to consider.
///
/// `None` means unrestricted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GestureFilter {
    /// Device kinds the recognizer listens to.
    pub supported_devices: Option<DeviceKinds>,
    /// Buttons the recognizer listens to. A pointer is allowed when at least
    /// one button is pressed and every pressed button is in this set.
    pub allowed_buttons: Option<Buttons>,
}

impl GestureFilter {
    /// Only admit pointers whose buttons are exactly within `buttons`.
    pub fn with_allowed_buttons(mut self, buttons: Buttons) -> Self {
        self.allowed_buttons = Some(buttons);
        self
    }

    /// Only admit pointers of the given device kinds.
    pub fn with_supported_devices(mut self, devices: DeviceKinds) -> Self {
        self.supported_devices = Some(devices);
        self
    }

    /// Whether `event` passes the filter.
    pub fn allows(&self, event: &PointerEvent) -> bool {
        let device_ok = self
            .supported_devices
            .is_none_or(|devices| devices.allows(event.kind));
        let buttons_ok = self
            .allowed_buttons
            .is_none_or(|allowed| !event.buttons.is_empty() && allowed.contains(event.buttons));
        device_ok && buttons_ok
    }
}

/// What a recognizer may do while handling a call from the host.
pub struct GestureContext<'a> {
    id: RecognizerId,
    router: &'a mut PointerRouter<RecognizerId>,
    arena: &'a mut GestureArenaManager<RecognizerId>,
    scheduler: &'a mut dyn Scheduler<GestureTask>,
    settings: &'a DeviceGestureSettings,
}

impl fmt::Debug for GestureContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureContext")
            .field("id", &self.id)
            .field("now", &self.scheduler.now())
            .field("settings", self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a> GestureContext<'a> {
    pub(crate) fn new(
        id: RecognizerId,
        router: &'a mut PointerRouter<RecognizerId>,
        arena: &'a mut GestureArenaManager<RecognizerId>,
        scheduler: &'a mut dyn Scheduler<GestureTask>,
        settings: &'a DeviceGestureSettings,
    ) -> Self {
        Self {
            id,
            router,
            arena,
            scheduler,
            settings,
        }
    }

    /// The recognizer being called.
    pub fn id(&self) -> RecognizerId {
        self.id
    }

    /// Current time of the host's scheduler.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Gesture settings of the current device.
    pub fn settings(&self) -> &DeviceGestureSettings {
        self.settings
    }

    /// Join the arena for `pointer`.
    ///
    /// # Panics
    ///
    /// Panics if that arena is already closed.
    pub fn join_arena(&mut self, pointer: PointerId) -> GestureArenaEntry<RecognizerId> {
        self.arena.add(pointer, self.id)
    }

    /// Resolve an arena entry.
    pub fn resolve(
        &mut self,
        entry: GestureArenaEntry<RecognizerId>,
        disposition: GestureDisposition,
    ) {
        self.arena.resolve(entry, disposition, &mut *self.scheduler);
    }

    /// Receive every subsequent event of `pointer`, localized by `transform`.
    pub fn add_route(&mut self, pointer: PointerId, transform: Option<Affine>) {
        self.router.add_route(pointer, self.id, transform);
    }

    /// Stop receiving events of `pointer`.
    pub fn remove_route(&mut self, pointer: PointerId) {
        self.router.remove_route(pointer, self.id);
    }

    /// Arm a deadline. When it elapses the host calls
    /// [`did_exceed_deadline`](GestureRecognizer::did_exceed_deadline).
    pub fn schedule_deadline(&mut self, delay: Duration, pointer: PointerId) -> TaskHandle {
        self.scheduler.schedule_timer(
            delay,
            GestureTask::Deadline {
                recognizer: self.id,
                pointer,
            },
        )
    }

    /// Cancel a task armed with [`schedule_deadline`](Self::schedule_deadline).
    pub fn cancel_task(&mut self, handle: TaskHandle) -> bool {
        self.scheduler.cancel(handle)
    }
}

/// Receives the outcome of arbitration for the pointers it competes for.
pub trait ArenaMember {
    /// The recognizer won the arena for `pointer`.
    fn accept_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId)
    -> GestureResult;

    /// The recognizer lost the arena for `pointer`.
    fn reject_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId)
    -> GestureResult;
}

/// Receives routed pointer events.
pub trait PointerEventSink {
    /// Handle an event of a pointer this recognizer routed to itself.
    fn handle_event(&mut self, cx: &mut GestureContext<'_>, event: &PointerEvent) -> GestureResult;
}

/// A gesture recognizer registered with the host.
pub trait GestureRecognizer: ArenaMember + PointerEventSink + Any {
    /// Device and button restrictions.
    fn filter(&self) -> &GestureFilter;

    /// Whether the recognizer wants to track `event`'s pointer.
    fn is_pointer_allowed(&self, event: &PointerEvent) -> bool {
        self.filter().allows(event)
    }

    /// Start tracking a pointer that passed [`is_pointer_allowed`](Self::is_pointer_allowed).
    fn add_allowed_pointer(
        &mut self,
        cx: &mut GestureContext<'_>,
        event: &PointerEvent,
    ) -> GestureResult;

    /// A pointer went down that this recognizer does not want.
    fn handle_non_allowed_pointer(
        &mut self,
        cx: &mut GestureContext<'_>,
        event: &PointerEvent,
    ) -> GestureResult {
        let _ = (cx, event);
        Ok(())
    }

    /// Offer a new pointer, usually on its down event.
    fn add_pointer(&mut self, cx: &mut GestureContext<'_>, event: &PointerEvent) -> GestureResult {
        if self.is_pointer_allowed(event) {
            self.add_allowed_pointer(cx, event)
        } else {
            self.handle_non_allowed_pointer(cx, event)
        }
    }

    /// A deadline armed for `pointer` elapsed.
    fn did_exceed_deadline(
        &mut self,
        cx: &mut GestureContext<'_>,
        pointer: PointerId,
    ) -> GestureResult {
        let _ = (cx, pointer);
        Ok(())
    }

    /// Give up every pointer: reject outstanding arena entries and remove routes.
    ///
    /// Must be idempotent.
    fn dispose(&mut self, cx: &mut GestureContext<'_>);

    /// Short name used in logs.
    fn debug_description(&self) -> &'static str;
}

/// Run a user callback, logging its name.
pub(crate) fn invoke_callback<F>(name: &'static str, callback: F) -> GestureResult
where
    F: FnOnce() -> GestureResult,
{
    tracing::trace!(callback = name, "invoking gesture callback");
    let result = callback();
    if let Err(err) = &result {
        tracing::debug!(callback = name, error = %err, "gesture callback failed");
    }
    result
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::scheduler::TaskQueue;

    /// Host state for driving a recognizer directly.
    #[derive(Default)]
    pub(crate) struct Harness {
        pub(crate) router: PointerRouter<RecognizerId>,
        pub(crate) arena: GestureArenaManager<RecognizerId>,
        pub(crate) queue: TaskQueue<GestureTask>,
        pub(crate) settings: DeviceGestureSettings,
    }

    pub(crate) const ID: RecognizerId = RecognizerId(0, 1);

    impl Harness {
        pub(crate) fn cx(&mut self) -> GestureContext<'_> {
            GestureContext::new(
                ID,
                &mut self.router,
                &mut self.arena,
                &mut self.queue,
                &self.settings,
            )
        }
    }
}
