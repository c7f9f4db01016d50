// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Velocity basics.
//!
//! Records a few pointer traces in a `VelocityTracker` and prints the fitted
//! velocity and its confidence: a steady swipe, a decelerating swipe, and a
//! swipe that paused before release.
//!
//! Run:
//! - `cargo run -p understory_demos --example velocity_basics`

use std::time::Duration;

use kurbo::Point;
use understory_gesture::{LeastSquaresSolver, VelocityTracker};
use understory_pointer::PointerKind;

fn trace(label: &str, samples: &[(u64, f64)]) {
    let mut tracker = VelocityTracker::new(PointerKind::Touch);
    for &(ms, x) in samples {
        tracker.add_position(Duration::from_millis(ms), Point::new(x, 0.0));
    }
    match tracker.estimate() {
        Some(estimate) => println!(
            "{label:<14} vx={:>8.1} px/s  confidence={:.3}  window={:?}",
            estimate.pixels_per_second.x, estimate.confidence, estimate.duration
        ),
        None => println!("{label:<14} no samples"),
    }
}

fn main() {
    trace("steady", &[(0, 0.0), (16, 16.0), (32, 32.0), (48, 48.0), (64, 64.0)]);
    trace(
        "decelerating",
        &[(0, 0.0), (16, 30.0), (32, 52.0), (48, 66.0), (64, 72.0)],
    );
    trace(
        "paused",
        &[(0, 0.0), (16, 40.0), (32, 80.0), (120, 82.0), (136, 82.0)],
    );

    // The solver on its own: y = 1 + 2x + 3x² recovered from five points.
    let x = [0.0, 1.0, 2.0, 3.0, 4.0];
    let y = x.map(|x: f64| 1.0 + 2.0 * x + 3.0 * x * x);
    let w = [1.0; 5];
    if let Some(fit) = LeastSquaresSolver::new(&x, &y, &w).solve(2) {
        println!(
            "\nfit coefficients {:?} confidence {:.3}",
            fit.coefficients, fit.confidence
        );
    }
}
