// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sanitizer basics.
//!
//! Feeds a messy raw stream (a mouse whose release was never reported, a
//! second button pressed mid-drag, a touch on a high-density screen) through a
//! `PointerEventSanitizer` and prints the canonical events that come out.
//!
//! Run:
//! - `cargo run -p understory_demos --example sanitizer_basics`

use std::time::Duration;

use kurbo::Point;
use understory_pointer::{
    Buttons, PointerEvent, PointerEventSanitizer, PointerKind, RawEventType, RawPointerEvent,
    SanitizerContext,
};

fn raw(
    event_type: RawEventType,
    kind: PointerKind,
    x: f64,
    buttons: Buttons,
    ms: u64,
) -> RawPointerEvent {
    RawPointerEvent::new(event_type, 7, kind, Point::new(x, 20.0))
        .with_buttons(buttons)
        .with_time_stamp(Duration::from_millis(ms))
}

fn print(label: &str, events: &[PointerEvent]) {
    println!("{label}");
    for ev in events {
        let origin = if ev.synthesized { "synth" } else { "real " };
        println!(
            "  {origin} {:<8} pointer={} pos=({:.1}, {:.1}) delta=({:.1}, {:.1}) buttons={:?}",
            format!("{:?}", ev.change),
            ev.pointer,
            ev.position.x,
            ev.position.y,
            ev.delta.x,
            ev.delta.y,
            ev.buttons,
        );
    }
}

fn main() {
    let mut cx = SanitizerContext::new();
    let mut sanitizer = PointerEventSanitizer::new();
    let mouse = PointerKind::Mouse;

    println!("== Mouse ==");
    let stream = [
        ("move", raw(RawEventType::Move, mouse, 10.0, Buttons::empty(), 0)),
        ("press primary", raw(RawEventType::Down, mouse, 12.0, Buttons::PRIMARY, 10)),
        (
            "press secondary too",
            raw(RawEventType::Down, mouse, 14.0, Buttons::PRIMARY | Buttons::SECONDARY, 20),
        ),
        // The release was lost: the next move reports no buttons.
        ("move, nothing held", raw(RawEventType::Move, mouse, 30.0, Buttons::empty(), 30)),
        ("duplicate up", raw(RawEventType::Up, mouse, 30.0, Buttons::empty(), 40)),
    ];
    for (label, event) in &stream {
        print(label, &sanitizer.sanitize(event, &mut cx));
    }

    println!("\n== Touch at 2x ==");
    sanitizer.set_device_pixel_ratio(2.0);
    let touch = PointerKind::Touch;
    let stream = [
        ("down", raw(RawEventType::Down, touch, 100.0, Buttons::empty(), 100)),
        ("move", raw(RawEventType::Move, touch, 140.0, Buttons::PRIMARY, 116)),
        // Lifts somewhere else: a move is synthesized before the up.
        ("up", raw(RawEventType::Up, touch, 150.0, Buttons::empty(), 132)),
    ];
    for (label, event) in &stream {
        print(label, &sanitizer.sanitize(event, &mut cx));
    }
    println!("\ndevices still known: {}", sanitizer.device_count());
}
