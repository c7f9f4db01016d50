// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Default gesture thresholds.
//!
//! Distances are in logical pixels, velocities in logical pixels per second.

use core::time::Duration;

/// Time a press must be held before a tap recognizer reports a tap-down
/// without having won the arena.
pub const PRESS_TIMEOUT: Duration = Duration::from_millis(100);

/// Distance a touch may travel before it is considered a drag rather than a tap.
pub const TOUCH_SLOP: f64 = 18.0;

/// Distance a precise pointer (mouse) may travel before it starts a drag.
pub const PRECISE_POINTER_HIT_SLOP: f64 = 1.0;

/// Distance a touch may travel before it is considered a pan.
pub const PAN_SLOP: f64 = TOUCH_SLOP * 2.0;

/// Distance a precise pointer may travel before it is considered a pan.
pub const PRECISE_POINTER_PAN_SLOP: f64 = PRECISE_POINTER_HIT_SLOP * 2.0;

/// Minimum release velocity for a drag to count as a fling.
pub const MIN_FLING_VELOCITY: f64 = 50.0;

/// Release velocities above this are clamped.
pub const MAX_FLING_VELOCITY: f64 = 8000.0;
