// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-device gesture configuration.

use understory_pointer::PointerKind;

use crate::constants::{PAN_SLOP, PRECISE_POINTER_HIT_SLOP, PRECISE_POINTER_PAN_SLOP, TOUCH_SLOP};

/// Gesture settings reported by the platform for the current device.
///
/// A `None` field means "use the built-in default for the pointer kind".
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DeviceGestureSettings {
    /// Touch slop override, in logical pixels.
    pub slop: Option<f64>,
}

impl DeviceGestureSettings {
    /// Settings with an explicit touch slop.
    pub fn with_slop(slop: f64) -> Self {
        Self { slop: Some(slop) }
    }

    /// The override, if any, otherwise [`TOUCH_SLOP`].
    pub fn touch_slop(&self) -> f64 {
        self.slop.unwrap_or(TOUCH_SLOP)
    }

    /// Twice the touch slop.
    pub fn pan_slop(&self) -> f64 {
        self.slop.map_or(PAN_SLOP, |s| s * 2.0)
    }
}

/// Distance `kind` may travel before a press turns into a drag.
///
/// Precise pointers use [`PRECISE_POINTER_HIT_SLOP`]; everything else uses the
/// device's touch slop.
pub fn compute_hit_slop(kind: PointerKind, settings: &DeviceGestureSettings) -> f64 {
    if kind.is_precise() {
        PRECISE_POINTER_HIT_SLOP
    } else {
        settings.touch_slop()
    }
}

/// Distance `kind` may travel before a press turns into a pan.
pub fn compute_pan_slop(kind: PointerKind, settings: &DeviceGestureSettings) -> f64 {
    if kind.is_precise() {
        PRECISE_POINTER_PAN_SLOP
    } else {
        settings.pan_slop()
    }
}
