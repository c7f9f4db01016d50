// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer velocity estimation.
//!
//! ## Overview
//!
//! [`VelocityTracker`] keeps the last 20 positions of a pointer. An estimate
//! fits a quadratic to the recent x(t) and y(t) samples with
//! [`LeastSquaresSolver`] and reads the velocity off the linear coefficient.
//!
//! Only the recent past counts: samples older than 100 ms, or separated from
//! the next sample by a gap over 40 ms (the pointer paused), are ignored.
//!
//! ```
//! use core::time::Duration;
//! use kurbo::Point;
//! use understory_gesture::VelocityTracker;
//! use understory_pointer::PointerKind;
//!
//! let mut tracker = VelocityTracker::new(PointerKind::Touch);
//! for ms in [0_u32, 16, 32, 48] {
//!     let at = Point::new(5.0 * f64::from(ms), 0.0);
//!     tracker.add_position(Duration::from_millis(ms.into()), at);
//! }
//! let estimate = tracker.estimate().unwrap();
//! assert!((estimate.pixels_per_second.x - 5000.0).abs() < 1e-6);
//! ```

mod lsq;

use core::time::Duration;

use kurbo::{Point, Vec2};
use understory_pointer::PointerKind;

pub use lsq::{LeastSquaresSolver, PolynomialFit};

const HISTORY_SIZE: usize = 20;
const HORIZON: Duration = Duration::from_millis(100);
const ASSUME_POINTER_MOVE_STOPPED: Duration = Duration::from_millis(40);
const MIN_SAMPLE_SIZE: usize = 3;

/// A velocity in logical pixels per second.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Velocity {
    /// Velocity in logical pixels per second.
    pub pixels_per_second: Vec2,
}

impl Velocity {
    /// A velocity of zero.
    pub const ZERO: Self = Self {
        pixels_per_second: Vec2::ZERO,
    };

    /// Create a velocity.
    pub const fn new(pixels_per_second: Vec2) -> Self {
        Self { pixels_per_second }
    }

    /// Keep the direction but clamp the speed to `min..=max`.
    ///
    /// A zero velocity has no direction and is returned unchanged.
    #[must_use]
    pub fn clamp_magnitude(self, min: f64, max: f64) -> Self {
        debug_assert!(min >= 0.0 && max >= min, "invalid range {min}..={max}");
        let speed_squared = self.pixels_per_second.hypot2();
        if speed_squared == 0.0 {
            return self;
        }
        let direction = self.pixels_per_second / self.pixels_per_second.hypot();
        if speed_squared > max * max {
            Self::new(direction * max)
        } else if speed_squared < min * min {
            Self::new(direction * min)
        } else {
            self
        }
    }
}

/// A velocity together with the evidence behind it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VelocityEstimate {
    /// Estimated velocity in logical pixels per second.
    pub pixels_per_second: Vec2,
    /// Quality of the fit in `[0, 1]`; `1` means the samples fit perfectly.
    pub confidence: f64,
    /// Time between the oldest and newest sample used.
    pub duration: Duration,
    /// Displacement between the oldest and newest sample used.
    pub offset: Vec2,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct PointAtTime {
    time: Duration,
    point: Point,
}

/// Estimates the velocity of one pointer from its recent positions.
#[derive(Clone, Debug)]
pub struct VelocityTracker {
    kind: PointerKind,
    samples: [Option<PointAtTime>; HISTORY_SIZE],
    index: usize,
}

impl VelocityTracker {
    /// Create an empty tracker for a pointer of `kind`.
    pub fn new(kind: PointerKind) -> Self {
        Self {
            kind,
            samples: [None; HISTORY_SIZE],
            index: 0,
        }
    }

    /// Kind of the tracked pointer.
    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    /// Record the pointer at `position` at `time`.
    pub fn add_position(&mut self, time: Duration, position: Point) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(PointAtTime {
            time,
            point: position,
        });
    }

    /// Estimate the current velocity.
    ///
    /// Returns `None` only when no position was ever recorded. When there are
    /// too few usable samples, or they cannot be fitted, the estimate has zero
    /// velocity and full confidence.
    pub fn estimate(&self) -> Option<VelocityEstimate> {
        let newest = self.samples[self.index]?;
        let mut x = [0.0; HISTORY_SIZE];
        let mut y = [0.0; HISTORY_SIZE];
        let mut time = [0.0; HISTORY_SIZE];
        let w = [1.0; HISTORY_SIZE];

        let mut sample_count = 0;
        let mut index = self.index;
        let mut previous = newest;
        let mut oldest = newest;
        while sample_count < HISTORY_SIZE {
            let Some(sample) = self.samples[index] else {
                break;
            };
            let age = newest.time.saturating_sub(sample.time);
            let gap = previous.time.abs_diff(sample.time);
            previous = sample;
            if age > HORIZON || gap > ASSUME_POINTER_MOVE_STOPPED {
                break;
            }
            oldest = sample;
            x[sample_count] = sample.point.x;
            y[sample_count] = sample.point.y;
            time[sample_count] = -duration_millis(age);
            index = index.checked_sub(1).unwrap_or(HISTORY_SIZE - 1);
            sample_count += 1;
        }

        let duration = newest.time.saturating_sub(oldest.time);
        let offset = newest.point - oldest.point;
        if sample_count >= MIN_SAMPLE_SIZE {
            let n = sample_count;
            let x_fit = LeastSquaresSolver::new(&time[..n], &x[..n], &w[..n]).solve(2);
            let y_fit = LeastSquaresSolver::new(&time[..n], &y[..n], &w[..n]).solve(2);
            if let (Some(x_fit), Some(y_fit)) = (x_fit, y_fit) {
                return Some(VelocityEstimate {
                    pixels_per_second: Vec2::new(
                        x_fit.coefficients[1] * 1000.0,
                        y_fit.coefficients[1] * 1000.0,
                    ),
                    confidence: x_fit.confidence * y_fit.confidence,
                    duration,
                    offset,
                });
            }
        }

        Some(VelocityEstimate {
            pixels_per_second: Vec2::ZERO,
            confidence: 1.0,
            duration,
            offset,
        })
    }

    /// The current velocity, zero when there is no estimate.
    pub fn velocity(&self) -> Velocity {
        self.estimate()
            .map_or(Velocity::ZERO, |e| Velocity::new(e.pixels_per_second))
    }

    /// Forget all samples.
    pub fn reset(&mut self) {
        self.samples = [None; HISTORY_SIZE];
        self.index = 0;
    }
}

fn duration_millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn line_tracker(times: &[u64]) -> VelocityTracker {
        let mut t = VelocityTracker::new(PointerKind::Touch);
        for &at in times {
            #[allow(clippy::cast_precision_loss, reason = "Small test values.")]
            let x = 5.0 * at as f64;
            t.add_position(ms(at), Point::new(x, 0.0));
        }
        t
    }

    #[test]
    fn empty_tracker_has_no_estimate() {
        let t = VelocityTracker::new(PointerKind::Mouse);
        assert_eq!(t.estimate(), None);
        assert_eq!(t.velocity(), Velocity::ZERO);
    }

    #[test]
    fn straight_line_is_5000_pixels_per_second() {
        let e = line_tracker(&[0, 16, 32, 48]).estimate().unwrap();
        assert!((e.pixels_per_second.x - 5000.0).abs() < 1e-6, "{e:?}");
        assert!(e.pixels_per_second.y.abs() < 1e-6, "{e:?}");
        assert!((e.confidence - 1.0).abs() < 1e-9, "{e:?}");
        assert_eq!(e.duration, ms(48));
        assert_eq!(e.offset, Vec2::new(240.0, 0.0));
    }

    #[test]
    fn two_samples_fall_back_to_zero() {
        let e = line_tracker(&[0, 16]).estimate().unwrap();
        assert_eq!(e.pixels_per_second, Vec2::ZERO);
        assert_eq!(e.confidence, 1.0);
        assert_eq!(e.offset, Vec2::new(80.0, 0.0));
    }

    #[test]
    fn pause_cuts_off_older_samples() {
        // The gap between 40 and 100 means only two samples are usable.
        let e = line_tracker(&[0, 20, 40, 100, 110]).estimate().unwrap();
        assert_eq!(e.pixels_per_second, Vec2::ZERO);
        assert_eq!(e.duration, ms(10));
    }

    #[test]
    fn horizon_limits_the_window() {
        let times: alloc::vec::Vec<u64> = (0..20).map(|i| i * 10).collect();
        let e = line_tracker(&times).estimate().unwrap();
        assert_eq!(e.duration, ms(100));
        assert!((e.pixels_per_second.x - 5000.0).abs() < 1e-3, "{e:?}");
    }

    #[test]
    fn ring_buffer_wraps() {
        let times: alloc::vec::Vec<u64> = (0..45).map(|i| i * 4).collect();
        let e = line_tracker(&times).estimate().unwrap();
        assert_eq!(e.duration, ms(76));
        assert!((e.pixels_per_second.x - 5000.0).abs() < 1e-3, "{e:?}");
    }

    #[test]
    fn clamp_magnitude_keeps_direction() {
        let v = Velocity::new(Vec2::new(30_000.0, 40_000.0)).clamp_magnitude(50.0, 8000.0);
        assert!((v.pixels_per_second.x - 4800.0).abs() < 1e-9);
        assert!((v.pixels_per_second.y - 6400.0).abs() < 1e-9);
        let slow = Velocity::new(Vec2::new(0.0, 10.0)).clamp_magnitude(50.0, 8000.0);
        assert_eq!(slow.pixels_per_second, Vec2::new(0.0, 50.0));
        assert_eq!(Velocity::ZERO.clamp_magnitude(50.0, 8000.0), Velocity::ZERO);
    }
}
