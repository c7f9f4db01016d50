// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kurbo::Point;
use understory_gesture::{LeastSquaresSolver, VelocityTracker};
use understory_pointer::PointerKind;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1_u64 << 53) as f64)
    }
}

fn filled_tracker(samples: u64, jitter: f64) -> VelocityTracker {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
    let mut tracker = VelocityTracker::new(PointerKind::Touch);
    for i in 0..samples {
        let x = 3.0 * i as f64 + jitter * rng.next_f64();
        let y = 1.5 * i as f64 + jitter * rng.next_f64();
        tracker.add_position(Duration::from_millis(i * 4), Point::new(x, y));
    }
    tracker
}

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("velocity_estimate");
    let cases = [("smooth_20", 20, 0.0), ("noisy_20", 20, 2.0), ("short_3", 3, 0.0)];
    for (name, samples, jitter) in cases {
        let tracker = filled_tracker(samples, jitter);
        group.bench_function(name, |b| b.iter(|| black_box(&tracker).estimate()));
    }
    group.finish();
}

fn bench_add_position(c: &mut Criterion) {
    c.bench_function("velocity_add_position_x100", |b| {
        b.iter(|| {
            let mut tracker = VelocityTracker::new(PointerKind::Mouse);
            for i in 0..100_u64 {
                tracker.add_position(Duration::from_millis(i), Point::new(i as f64, 0.0));
            }
            black_box(tracker)
        });
    });
}

fn bench_solver(c: &mut Criterion) {
    let mut rng = Rng(42);
    let x: Vec<f64> = (0..20).map(|i| -(i as f64) * 4.0).collect();
    let y: Vec<f64> = x.iter().map(|t| 0.5 * t * t - 3.0 * t + rng.next_f64()).collect();
    let w = vec![1.0; 20];
    c.bench_function("lsq_degree2_20", |b| {
        b.iter(|| LeastSquaresSolver::new(black_box(&x), black_box(&y), black_box(&w)).solve(2));
    });
}

criterion_group!(benches, bench_estimate, bench_add_position, bench_solver);
criterion_main!(benches);
