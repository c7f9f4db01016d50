// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tap recognition.
//!
//! ## Callback order
//!
//! For a successful tap: `on_tap_down`, `on_tap_up`, `on_tap`.
//!
//! - `on_tap_down` fires once the recognizer wins the arena or the press
//!   timeout elapses, whichever comes first.
//! - `on_tap_up` and `on_tap` fire once the pointer is up *and* the arena is won.
//! - `on_tap_cancel` fires, after `on_tap_down`, when the tap can no longer
//!   succeed: the pointer was cancelled, the arena was lost, or the
//!   recognizer gave up after winning.
//!
//! Each of the primary, secondary and tertiary buttons has its own callbacks.
//! A press is only tracked when its button has at least one callback.

use alloc::boxed::Box;
use core::fmt;

use kurbo::Point;
use understory_pointer::{Buttons, PointerChange, PointerEvent, PointerId, PointerKind};

use crate::arena::GestureDisposition;
use crate::constants::PRESS_TIMEOUT;
use crate::error::GestureResult;
use crate::recognizer::{
    ArenaMember, GestureContext, GestureFilter, GestureRecognizer, GestureRecognizerState,
    PointerEventSink, PrimaryPointerState, PrimaryStep, invoke_callback,
};

/// Where a tap went down.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TapDownDetails {
    /// Position in global coordinates.
    pub global_position: Point,
    /// Position in the coordinates of the target that added the pointer.
    pub local_position: Point,
    /// Kind of the pointer.
    pub kind: PointerKind,
}

/// Where a tap went up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TapUpDetails {
    /// Position in global coordinates.
    pub global_position: Point,
    /// Position in the coordinates of the target that added the pointer.
    pub local_position: Point,
    /// Kind of the pointer.
    pub kind: PointerKind,
}

/// Button a tap is made with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TapButton {
    /// [`Buttons::PRIMARY`].
    Primary,
    /// [`Buttons::SECONDARY`].
    Secondary,
    /// [`Buttons::TERTIARY`].
    Tertiary,
}

impl TapButton {
    /// The button pressed alone in `buttons`, if it is one of the tap buttons.
    pub fn from_buttons(buttons: Buttons) -> Option<Self> {
        if buttons == Buttons::PRIMARY {
            Some(Self::Primary)
        } else if buttons == Buttons::SECONDARY {
            Some(Self::Secondary)
        } else if buttons == Buttons::TERTIARY {
            Some(Self::Tertiary)
        } else {
            None
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Tertiary => 2,
        }
    }

    /// Callback names for down, up, tap and cancel.
    const fn names(self) -> [&'static str; 4] {
        match self {
            Self::Primary => ["on_tap_down", "on_tap_up", "on_tap", "on_tap_cancel"],
            Self::Secondary => [
                "on_secondary_tap_down",
                "on_secondary_tap_up",
                "on_secondary_tap",
                "on_secondary_tap_cancel",
            ],
            Self::Tertiary => [
                "on_tertiary_tap_down",
                "on_tertiary_tap_up",
                "on_tertiary_tap",
                "on_tertiary_tap_cancel",
            ],
        }
    }
}

/// Called when a tap goes down.
pub type TapDownCallback = Box<dyn FnMut(&TapDownDetails) -> GestureResult>;
/// Called when a tap goes up.
pub type TapUpCallback = Box<dyn FnMut(&TapUpDetails) -> GestureResult>;
/// Called for taps and cancellations.
pub type TapCallback = Box<dyn FnMut() -> GestureResult>;

/// Callbacks for one button.
#[derive(Default)]
pub struct TapCallbacks {
    /// A pointer that may cause a tap went down.
    pub on_tap_down: Option<TapDownCallback>,
    /// A pointer that caused a tap went up.
    pub on_tap_up: Option<TapUpCallback>,
    /// A tap occurred. Called right after `on_tap_up`.
    pub on_tap: Option<TapCallback>,
    /// The pointer that triggered `on_tap_down` will not cause a tap.
    pub on_tap_cancel: Option<TapCallback>,
}

impl fmt::Debug for TapCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapCallbacks")
            .field("on_tap_down", &self.on_tap_down.is_some())
            .field("on_tap_up", &self.on_tap_up.is_some())
            .field("on_tap", &self.on_tap.is_some())
            .field("on_tap_cancel", &self.on_tap_cancel.is_some())
            .finish()
    }
}

impl TapCallbacks {
    /// Whether no callback is set.
    pub fn is_empty(&self) -> bool {
        self.on_tap_down.is_none()
            && self.on_tap_up.is_none()
            && self.on_tap.is_none()
            && self.on_tap_cancel.is_none()
    }
}

/// Recognizes taps.
pub struct TapGestureRecognizer {
    filter: GestureFilter,
    primary: PrimaryPointerState,
    callbacks: [TapCallbacks; 3],
    down: Option<PointerEvent>,
    up: Option<PointerEvent>,
    sent_tap_down: bool,
    won_arena_for_primary_pointer: bool,
}

impl fmt::Debug for TapGestureRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapGestureRecognizer")
            .field("state", &self.primary.state())
            .field("primary_pointer", &self.primary.primary_pointer())
            .field("sent_tap_down", &self.sent_tap_down)
            .field("won_arena_for_primary_pointer", &self.won_arena_for_primary_pointer)
            .finish_non_exhaustive()
    }
}

impl Default for TapGestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TapGestureRecognizer {
    /// Create a recognizer without callbacks, with a press timeout of
    /// [`PRESS_TIMEOUT`].
    pub fn new() -> Self {
        Self {
            filter: GestureFilter::default(),
            primary: PrimaryPointerState::new(Some(PRESS_TIMEOUT)),
            callbacks: Default::default(),
            down: None,
            up: None,
            sent_tap_down: false,
            won_arena_for_primary_pointer: false,
        }
    }

    /// Restrict the device kinds and buttons considered.
    pub fn with_filter(mut self, filter: GestureFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the callbacks of `button`.
    pub fn with_callbacks(mut self, button: TapButton, callbacks: TapCallbacks) -> Self {
        self.callbacks[button.index()] = callbacks;
        self
    }

    /// Set the primary button's `on_tap_down`.
    pub fn on_tap_down(
        mut self,
        f: impl FnMut(&TapDownDetails) -> GestureResult + 'static,
    ) -> Self {
        self.callbacks[0].on_tap_down = Some(Box::new(f));
        self
    }

    /// Set the primary button's `on_tap_up`.
    pub fn on_tap_up(mut self, f: impl FnMut(&TapUpDetails) -> GestureResult + 'static) -> Self {
        self.callbacks[0].on_tap_up = Some(Box::new(f));
        self
    }

    /// Set the primary button's `on_tap`.
    pub fn on_tap(mut self, f: impl FnMut() -> GestureResult + 'static) -> Self {
        self.callbacks[0].on_tap = Some(Box::new(f));
        self
    }

    /// Set the primary button's `on_tap_cancel`.
    pub fn on_tap_cancel(mut self, f: impl FnMut() -> GestureResult + 'static) -> Self {
        self.callbacks[0].on_tap_cancel = Some(Box::new(f));
        self
    }

    /// Callbacks of `button`.
    pub fn callbacks_mut(&mut self, button: TapButton) -> &mut TapCallbacks {
        &mut self.callbacks[button.index()]
    }

    /// Lifecycle state of the primary pointer.
    pub fn state(&self) -> GestureRecognizerState {
        self.primary.state()
    }

    fn resolve(
        &mut self,
        cx: &mut GestureContext<'_>,
        disposition: GestureDisposition,
    ) -> GestureResult {
        let mut result = Ok(());
        if self.won_arena_for_primary_pointer && disposition == GestureDisposition::Rejected {
            result = self.check_cancel();
            self.reset();
        }
        self.primary.resolve(cx, disposition);
        result
    }

    fn handle_primary_pointer(
        &mut self,
        cx: &mut GestureContext<'_>,
        event: &PointerEvent,
    ) -> GestureResult {
        self.primary.assert_possible();
        match event.change {
            PointerChange::Up => {
                self.up = Some(*event);
                self.check_up()
            }
            PointerChange::Cancel => {
                let resolved = self.resolve(cx, GestureDisposition::Rejected);
                let cancelled = if self.sent_tap_down {
                    self.check_cancel()
                } else {
                    Ok(())
                };
                self.reset();
                resolved.and(cancelled)
            }
            _ if self.down.is_some_and(|down| down.buttons != event.buttons) => {
                let resolved = self.resolve(cx, GestureDisposition::Rejected);
                self.primary.stop_tracking(cx, event.pointer);
                resolved
            }
            _ => Ok(()),
        }
    }

    fn check_down(&mut self) -> GestureResult {
        if self.sent_tap_down {
            return Ok(());
        }
        let Some(down) = self.down else {
            return Ok(());
        };
        self.sent_tap_down = true;
        let Some(button) = TapButton::from_buttons(down.buttons) else {
            return Ok(());
        };
        let details = TapDownDetails {
            global_position: down.position,
            local_position: down.local_position,
            kind: down.kind,
        };
        let [name, ..] = button.names();
        match &mut self.callbacks[button.index()].on_tap_down {
            Some(callback) => invoke_callback(name, || callback(&details)),
            None => Ok(()),
        }
    }

    fn check_up(&mut self) -> GestureResult {
        if !self.won_arena_for_primary_pointer {
            return Ok(());
        }
        let (Some(down), Some(up)) = (self.down, self.up) else {
            return Ok(());
        };
        let mut result = Ok(());
        if let Some(button) = TapButton::from_buttons(down.buttons) {
            let details = TapUpDetails {
                global_position: up.position,
                local_position: up.local_position,
                kind: up.kind,
            };
            let [_, up_name, tap_name, _] = button.names();
            let callbacks = &mut self.callbacks[button.index()];
            if let Some(callback) = &mut callbacks.on_tap_up {
                result = invoke_callback(up_name, || callback(&details));
            }
            if let Some(callback) = &mut callbacks.on_tap {
                result = result.and(invoke_callback(tap_name, || callback()));
            }
        }
        self.reset();
        result
    }

    fn check_cancel(&mut self) -> GestureResult {
        let Some(button) = self.down.and_then(|down| TapButton::from_buttons(down.buttons)) else {
            return Ok(());
        };
        let [.., name] = button.names();
        match &mut self.callbacks[button.index()].on_tap_cancel {
            Some(callback) => invoke_callback(name, || callback()),
            None => Ok(()),
        }
    }

    fn reset(&mut self) {
        self.sent_tap_down = false;
        self.won_arena_for_primary_pointer = false;
        self.up = None;
        self.down = None;
    }
}

impl ArenaMember for TapGestureRecognizer {
    fn accept_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> GestureResult {
        if !self.primary.accept_gesture(cx, pointer) || self.down.is_none() {
            return Ok(());
        }
        let down = self.check_down();
        self.won_arena_for_primary_pointer = true;
        let up = self.check_up();
        down.and(up)
    }

    fn reject_gesture(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> GestureResult {
        if !self.primary.reject_gesture(cx, pointer) {
            return Ok(());
        }
        let result = if self.sent_tap_down {
            self.check_cancel()
        } else {
            Ok(())
        };
        self.reset();
        result
    }
}

impl PointerEventSink for TapGestureRecognizer {
    fn handle_event(&mut self, cx: &mut GestureContext<'_>, event: &PointerEvent) -> GestureResult {
        let result = match self.primary.begin_event(event) {
            PrimaryStep::Primary => self.handle_primary_pointer(cx, event),
            PrimaryStep::SlopExceeded => {
                let resolved = self.resolve(cx, GestureDisposition::Rejected);
                self.primary.stop_tracking(cx, event.pointer);
                resolved
            }
            PrimaryStep::Other => Ok(()),
        };
        self.primary.end_event(cx, event);
        result
    }
}

impl GestureRecognizer for TapGestureRecognizer {
    fn filter(&self) -> &GestureFilter {
        &self.filter
    }

    fn is_pointer_allowed(&self, event: &PointerEvent) -> bool {
        let Some(button) = TapButton::from_buttons(event.buttons) else {
            return false;
        };
        !self.callbacks[button.index()].is_empty() && self.filter.allows(event)
    }

    fn add_allowed_pointer(
        &mut self,
        cx: &mut GestureContext<'_>,
        event: &PointerEvent,
    ) -> GestureResult {
        if self.primary.state() == GestureRecognizerState::Ready {
            if self.down.is_some() && self.up.is_some() {
                self.reset();
            }
            self.down = Some(*event);
        }
        if self.down.is_some() {
            self.primary.add_allowed_pointer(cx, event);
        }
        Ok(())
    }

    fn handle_non_allowed_pointer(
        &mut self,
        cx: &mut GestureContext<'_>,
        _event: &PointerEvent,
    ) -> GestureResult {
        self.primary.handle_non_allowed_pointer(cx);
        Ok(())
    }

    fn did_exceed_deadline(
        &mut self,
        _cx: &mut GestureContext<'_>,
        pointer: PointerId,
    ) -> GestureResult {
        if self.primary.deadline_elapsed(pointer) {
            self.check_down()
        } else {
            Ok(())
        }
    }

    fn dispose(&mut self, cx: &mut GestureContext<'_>) {
        self.primary.dispose(cx);
    }

    fn debug_description(&self) -> &'static str {
        "tap"
    }
}
