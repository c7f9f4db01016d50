// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena basics.
//!
//! A card that can be tapped and dragged sits in a toy scene. Raw touch input
//! goes through a `GestureBinding`: the first contact stays still and the tap
//! wins when the arena is swept on release; the second contact moves past the
//! slop and the drag claims it mid-gesture; the third lands outside the card.
//!
//! Run:
//! - `cargo run -p understory_demos --example arena_basics`

use std::time::Duration;

use kurbo::{Point, Rect};
use understory_gesture::{
    DragDetails, DragGestureRecognizer, DragTarget, GestureBinding, GestureError, GestureResult,
    Gestures, RecognizerId, TapGestureRecognizer,
};
use understory_pointer::{
    Buttons, PointerChange, PointerEvent, PointerKind, RawEventType, RawPointerEvent,
};
use understory_responder::{HitTestEntry, HitTestResult, HitTestTarget, HitTestable};

struct Printer;

impl DragTarget for Printer {
    fn update(&mut self, details: &DragDetails) -> GestureResult {
        println!(
            "    drag update delta=({:.0}, {:.0}) local=({:.0}, {:.0})",
            details.delta.x, details.delta.y, details.local_position.x, details.local_position.y
        );
        Ok(())
    }

    fn end(&mut self, details: &DragDetails) -> GestureResult {
        println!(
            "    drag end velocity=({:.0}, {:.0}) px/s",
            details.velocity.pixels_per_second.x, details.velocity.pixels_per_second.y
        );
        Ok(())
    }

    fn cancel(&mut self) -> GestureResult {
        println!("    drag cancel");
        Ok(())
    }
}

/// One card at (50, 50), 200 by 100.
struct Scene {
    card: Rect,
    tap: RecognizerId,
    drag: RecognizerId,
}

impl HitTestable<&'static str> for Scene {
    fn hit_test(&self, result: &mut HitTestResult<&'static str>, position: Point) {
        if self.card.contains(position) {
            result.push_offset(-self.card.origin().to_vec2());
            result.add(HitTestEntry::new("card"));
            result.pop_transform();
        }
    }
}

impl HitTestTarget<&'static str, Gestures> for Scene {
    type Error = GestureError;

    fn handle_event(
        &mut self,
        gestures: &mut Gestures,
        event: &PointerEvent,
        entry: &HitTestEntry<&'static str>,
    ) -> Result<(), GestureError> {
        println!(
            "  {} sees {:?} at local ({:.0}, {:.0})",
            entry.target(),
            event.change,
            event.local_position.x,
            event.local_position.y
        );
        if event.change == PointerChange::Down {
            gestures.add_pointer(self.tap, event)?;
            gestures.add_pointer(self.drag, event)?;
        }
        Ok(())
    }
}

fn contact(
    binding: &mut GestureBinding<&'static str>,
    scene: &mut Scene,
    start_ms: u64,
    xs: &[f64],
) {
    let Some((&first, rest)) = xs.split_first() else {
        return;
    };
    let raw = |event_type: RawEventType, x: f64, ms: u64| {
        let buttons = if event_type == RawEventType::Move {
            Buttons::PRIMARY
        } else {
            Buttons::empty()
        };
        RawPointerEvent::new(event_type, 3, PointerKind::Touch, Point::new(x, 100.0))
            .with_buttons(buttons)
            .with_time_stamp(Duration::from_millis(ms))
    };
    let mut ms = start_ms;
    binding.handle_raw_event(&raw(RawEventType::Down, first, ms), scene);
    let mut last = first;
    for &x in rest {
        ms += 16;
        binding.handle_raw_event(&raw(RawEventType::Move, x, ms), scene);
        last = x;
    }
    ms += 16;
    binding.handle_raw_event(&raw(RawEventType::Up, last, ms), scene);
}

fn main() {
    let mut binding = GestureBinding::new();
    let gestures = binding.gestures_mut();
    let tap = gestures.register(
        TapGestureRecognizer::new()
            .on_tap_down(|details| {
                println!("    tap down at local {:?}", details.local_position);
                Ok(())
            })
            .on_tap(|| {
                println!("    tap");
                Ok(())
            })
            .on_tap_cancel(|| {
                println!("    tap cancel");
                Ok(())
            }),
    );
    let drag = gestures.register(DragGestureRecognizer::new().on_start(|at| {
        println!("    drag start at {at:?}");
        Some(Box::new(Printer) as Box<dyn DragTarget>)
    }));
    println!("tap = {tap}, drag = {drag}");
    let mut scene = Scene {
        card: Rect::new(50.0, 50.0, 250.0, 150.0),
        tap,
        drag,
    };

    println!("\n== Still contact ==");
    contact(&mut binding, &mut scene, 0, &[100.0, 102.0, 101.0]);

    println!("\n== Moving contact ==");
    contact(&mut binding, &mut scene, 1_000, &[100.0, 108.0, 122.0, 142.0, 162.0]);

    println!("\n== Contact outside the card ==");
    contact(&mut binding, &mut scene, 2_000, &[10.0, 12.0]);

    println!(
        "\nroutes left: {}",
        if binding.gestures().router().is_empty() { "none" } else { "some" }
    );
}
