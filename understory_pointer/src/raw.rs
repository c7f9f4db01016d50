// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw platform input shaped like the DOM `PointerEvent` contract.

use core::time::Duration;

use kurbo::Point;

use crate::types::{Buttons, PointerKind};

/// DOM pointer event `type` handled by the sanitizer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RawEventType {
    /// `pointerdown`.
    Down,
    /// `pointermove`.
    Move,
    /// `pointerup`.
    Up,
    /// `pointercancel`.
    Cancel,
}

/// A raw pointer event as delivered by the platform.
///
/// Fields mirror the DOM contract: `pointer_id` is the platform contact id,
/// `buttons` the bitmask of currently pressed buttons, and `button` the index of
/// the button whose state changed (`-1` when none did).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawPointerEvent {
    /// Event type.
    pub event_type: RawEventType,
    /// Platform contact id (`pointerId`).
    pub pointer_id: i64,
    /// Device kind (`pointerType`).
    pub pointer_type: PointerKind,
    /// Pressed buttons after the event (`buttons`).
    pub buttons: Buttons,
    /// Button whose state changed (`button`), `-1` for none.
    pub button: i16,
    /// Position in logical pixels (`x`, `y`).
    pub position: Point,
    /// Time stamp (`timeStamp`).
    pub time_stamp: Duration,
}

impl RawPointerEvent {
    /// Create a raw event with no buttons and `button == -1`.
    pub fn new(
        event_type: RawEventType,
        pointer_id: i64,
        pointer_type: PointerKind,
        position: Point,
    ) -> Self {
        Self {
            event_type,
            pointer_id,
            pointer_type,
            buttons: Buttons::empty(),
            button: -1,
            position,
            time_stamp: Duration::ZERO,
        }
    }

    /// Set the pressed buttons mask.
    #[must_use]
    pub fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = buttons;
        self
    }

    /// Set the changed button index.
    #[must_use]
    pub fn with_button(mut self, button: i16) -> Self {
        self.button = button;
        self
    }

    /// Set the time stamp.
    #[must_use]
    pub fn with_time_stamp(mut self, time_stamp: Duration) -> Self {
        self.time_stamp = time_stamp;
        self
    }

    /// Convert a DOM `timeStamp` (fractional milliseconds) into a [`Duration`].
    ///
    /// The fractional part is kept with microsecond precision. Negative and
    /// non-finite inputs map to zero.
    pub fn time_stamp_from_millis(millis: f64) -> Duration {
        if !(millis.is_finite() && millis > 0.0) {
            return Duration::ZERO;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Platform time stamps fit in u64 microseconds."
        )]
        let micros = (millis * 1000.0) as u64;
        Duration::from_micros(micros)
    }
}
