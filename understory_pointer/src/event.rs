// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical pointer events and coordinate localization.
//!
//! ## Global and local coordinates
//!
//! A [`PointerEvent`] always carries its untransformed, global values in
//! [`position`](PointerEvent::position) and [`delta`](PointerEvent::delta).
//! Consumers living in a transformed coordinate space receive a copy produced by
//! [`PointerEvent::transformed`], whose [`local_position`](PointerEvent::local_position)
//! and [`local_delta`](PointerEvent::local_delta) are recomputed from the global
//! values. Transforming never compounds: transforming an already transformed event
//! starts again from the global values.
//!
//! ```
//! use kurbo::{Affine, Point, Vec2};
//! use understory_pointer::{PointerChange, PointerEvent, PointerId};
//!
//! let ev = PointerEvent::new(PointerId(1), PointerChange::Move, Point::new(10.0, 10.0))
//!     .with_delta(Vec2::new(2.0, 0.0));
//! let local = ev.transformed(Some(Affine::scale(2.0)));
//! assert_eq!(local.local_position, Point::new(20.0, 20.0));
//! assert_eq!(local.local_delta, Vec2::new(4.0, 0.0));
//! // Global values are untouched.
//! assert_eq!(local.position, ev.position);
//! assert_eq!(local.original(), ev);
//! ```

use core::time::Duration;

use kurbo::{Affine, Point, Vec2};

use crate::types::{Buttons, DeviceId, PointerChange, PointerId, PointerKind};

/// A sanitized pointer event.
///
/// Produced by [`PointerEventSanitizer::sanitize`](crate::PointerEventSanitizer::sanitize).
/// Events are plain values; every transformation returns a new event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Contact identifier; unique per down → up sequence.
    pub pointer: PointerId,
    /// Device that produced the event.
    pub device: DeviceId,
    /// Kind of device that produced the event.
    pub kind: PointerKind,
    /// The transition this event describes.
    pub change: PointerChange,
    /// Time at which the platform reported the event.
    pub time_stamp: Duration,
    /// Global position in logical pixels.
    pub position: Point,
    /// Global distance moved since the previous event from this device, in logical pixels.
    pub delta: Vec2,
    /// [`position`](Self::position) in the receiver's local coordinate space.
    pub local_position: Point,
    /// [`delta`](Self::delta) in the receiver's local coordinate space.
    pub local_delta: Vec2,
    /// Global position in physical pixels.
    pub physical_position: Point,
    /// Global distance moved in physical pixels.
    pub physical_delta: Vec2,
    /// Buttons pressed at the time of the event.
    pub buttons: Buttons,
    /// Whether the pointer is in contact after this event.
    pub down: bool,
    /// Whether the sanitizer fabricated this event to keep the stream well-formed.
    pub synthesized: bool,
    /// Global → local transform applied to produce the local values, if any.
    pub transform: Option<Affine>,
}

impl PointerEvent {
    /// Create an untransformed event at `position` with no motion.
    ///
    /// Defaults: device `0`, [`PointerKind::Touch`], time zero, and a primary
    /// button pressed exactly when `change` leaves the pointer down. Use the
    /// `with_*` methods to adjust.
    pub fn new(pointer: PointerId, change: PointerChange, position: Point) -> Self {
        let down = change.leaves_down();
        Self {
            pointer,
            device: DeviceId(0),
            kind: PointerKind::Touch,
            change,
            time_stamp: Duration::ZERO,
            position,
            delta: Vec2::ZERO,
            local_position: position,
            local_delta: Vec2::ZERO,
            physical_position: position,
            physical_delta: Vec2::ZERO,
            buttons: if down {
                Buttons::PRIMARY
            } else {
                Buttons::empty()
            },
            down,
            synthesized: false,
            transform: None,
        }
    }

    /// Set the device kind.
    #[must_use]
    pub fn with_kind(mut self, kind: PointerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the device id.
    #[must_use]
    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = device;
        self
    }

    /// Set the pressed buttons.
    #[must_use]
    pub fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = buttons;
        self
    }

    /// Set the time stamp.
    #[must_use]
    pub fn with_time_stamp(mut self, time_stamp: Duration) -> Self {
        self.time_stamp = time_stamp;
        self
    }

    /// Set the global delta (and the matching untransformed local and physical deltas).
    #[must_use]
    pub fn with_delta(mut self, delta: Vec2) -> Self {
        self.delta = delta;
        self.local_delta = delta;
        self.physical_delta = delta;
        self
    }

    /// Mark the event as synthesized.
    #[must_use]
    pub fn with_synthesized(mut self, synthesized: bool) -> Self {
        self.synthesized = synthesized;
        self
    }

    /// Return a copy localized by `transform`.
    ///
    /// The local values are recomputed from the global ones, so the result does
    /// not depend on any transform previously applied to `self`. `None` returns
    /// the untransformed event.
    pub fn transformed(&self, transform: Option<Affine>) -> Self {
        let Some(transform) = transform else {
            return self.original();
        };
        let local_position = Self::transform_position(Some(transform), self.position);
        Self {
            local_position,
            local_delta: Self::transform_delta_via_positions(
                self.position,
                local_position,
                self.delta,
                Some(transform),
            ),
            transform: Some(transform),
            ..*self
        }
    }

    /// The untransformed event this event was derived from.
    pub fn original(&self) -> Self {
        Self {
            local_position: self.position,
            local_delta: self.delta,
            transform: None,
            ..*self
        }
    }

    /// Apply `transform` to `position`, or return `position` when there is no transform.
    pub fn transform_position(transform: Option<Affine>, position: Point) -> Point {
        match transform {
            Some(t) => t * position,
            None => position,
        }
    }

    /// Transform a delta by mapping both of its end points.
    ///
    /// Unlike applying the linear part alone, this stays correct for perspective-free
    /// affine maps regardless of where the delta starts.
    pub fn transform_delta_via_positions(
        untransformed_end: Point,
        transformed_end: Point,
        untransformed_delta: Vec2,
        transform: Option<Affine>,
    ) -> Vec2 {
        let Some(transform) = transform else {
            return untransformed_delta;
        };
        let transformed_start = transform * (untransformed_end - untransformed_delta);
        transformed_end - transformed_start
    }
}
