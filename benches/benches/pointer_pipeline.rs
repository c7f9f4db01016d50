// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Vec2};
use understory_gesture::{
    DragDetails, DragGestureRecognizer, DragTarget, GestureBinding, GestureError, GestureResult,
    Gestures, RecognizerId, TapGestureRecognizer,
};
use understory_pointer::{
    Buttons, PointerChange, PointerEvent, PointerEventSanitizer, PointerKind, RawEventType,
    RawPointerEvent, SanitizerContext,
};
use understory_responder::{HitTestEntry, HitTestResult, HitTestTarget, HitTestable};

fn raw_stream(contacts: usize, moves: usize) -> Vec<RawPointerEvent> {
    let mut out = Vec::with_capacity(contacts * (moves + 2));
    let mut ms = 0_u64;
    for c in 0..contacts {
        let kind = if c % 2 == 0 {
            PointerKind::Touch
        } else {
            PointerKind::Mouse
        };
        let at = |x: f64, ty: RawEventType, buttons: Buttons, ms: u64| {
            RawPointerEvent::new(ty, 1, kind, Point::new(x, 50.0))
                .with_buttons(buttons)
                .with_time_stamp(Duration::from_millis(ms))
        };
        out.push(at(10.0, RawEventType::Down, Buttons::PRIMARY, ms));
        for m in 0..moves {
            ms += 8;
            out.push(at(10.0 + 3.0 * m as f64, RawEventType::Move, Buttons::PRIMARY, ms));
        }
        ms += 8;
        out.push(at(10.0 + 3.0 * moves as f64, RawEventType::Up, Buttons::empty(), ms));
        ms += 200;
    }
    out
}

fn bench_sanitizer(c: &mut Criterion) {
    let stream = raw_stream(50, 20);
    let mut group = c.benchmark_group("sanitizer");
    group.throughput(Throughput::Elements(stream.len() as u64));
    group.bench_function("mixed_contacts", |b| {
        b.iter_batched(
            || (PointerEventSanitizer::new(), SanitizerContext::new()),
            |(mut sanitizer, mut cx)| {
                let mut n = 0;
                for raw in &stream {
                    n += sanitizer.sanitize(black_box(raw), &mut cx).len();
                }
                n
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_hit_test_transforms(c: &mut Criterion) {
    c.bench_function("hit_test_nested_offsets_32", |b| {
        b.iter(|| {
            let mut result = HitTestResult::new();
            for depth in 0..32_u32 {
                result.push_offset(Vec2::new(1.0, 2.0));
                result.add(HitTestEntry::new(depth));
            }
            for _ in 0..32 {
                result.pop_transform();
            }
            black_box(result.into_path())
        });
    });
}

struct Noop;

impl DragTarget for Noop {
    fn update(&mut self, _: &DragDetails) -> GestureResult {
        Ok(())
    }

    fn end(&mut self, _: &DragDetails) -> GestureResult {
        Ok(())
    }

    fn cancel(&mut self) -> GestureResult {
        Ok(())
    }
}

struct Grid {
    cells: Vec<(Rect, RecognizerId, RecognizerId)>,
}

impl HitTestable<usize> for Grid {
    fn hit_test(&self, result: &mut HitTestResult<usize>, position: Point) {
        for (i, (rect, _, _)) in self.cells.iter().enumerate() {
            if rect.contains(position) {
                result.push_offset(-rect.origin().to_vec2());
                result.add(HitTestEntry::new(i));
                result.pop_transform();
            }
        }
    }
}

impl HitTestTarget<usize, Gestures> for Grid {
    type Error = GestureError;

    fn handle_event(
        &mut self,
        gestures: &mut Gestures,
        event: &PointerEvent,
        entry: &HitTestEntry<usize>,
    ) -> Result<(), GestureError> {
        if event.change == PointerChange::Down {
            let (_, tap, drag) = self.cells[*entry.target()];
            gestures.add_pointer(tap, event)?;
            gestures.add_pointer(drag, event)?;
        }
        Ok(())
    }
}

fn grid(binding: &mut GestureBinding<usize>) -> Grid {
    let mut cells = Vec::new();
    for i in 0..16 {
        let origin = Point::new(f64::from(i % 4) * 100.0, f64::from(i / 4) * 100.0);
        let gestures = binding.gestures_mut();
        let tap = gestures.register(TapGestureRecognizer::new().on_tap(|| Ok(())));
        let drag = gestures.register(
            DragGestureRecognizer::new().on_start(|_| Some(Box::new(Noop) as Box<dyn DragTarget>)),
        );
        cells.push((Rect::from_origin_size(origin, (100.0, 100.0)), tap, drag));
    }
    Grid { cells }
}

fn bench_binding(c: &mut Criterion) {
    let stream = raw_stream(50, 20);
    let mut group = c.benchmark_group("binding");
    group.throughput(Throughput::Elements(stream.len() as u64));
    group.bench_function("taps_and_drags", |b| {
        b.iter_batched(
            || {
                let mut binding = GestureBinding::new();
                let scene = grid(&mut binding);
                (binding, scene)
            },
            |(mut binding, mut scene)| {
                for raw in &stream {
                    binding.handle_raw_event(raw, &mut scene);
                }
                binding
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_sanitizer,
    bench_hit_test_transforms,
    bench_binding
);
criterion_main!(benches);
