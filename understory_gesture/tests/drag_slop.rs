// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for drag slop: movement inside the slop never decides the
//! arena, the move that leaves it claims the pointer exactly once, and a
//! release inside it leaves the pointer to the tap.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use kurbo::{Point, Vec2};
use proptest::prelude::*;
use understory_gesture::{
    DragDetails, DragGestureRecognizer, DragTarget, GestureRecognizerState, GestureResult, Gestures,
    TOUCH_SLOP, TapGestureRecognizer,
};
use understory_pointer::{Buttons, PointerChange, PointerEvent, PointerId, PointerKind};

const P: PointerId = PointerId(1);

struct Ignore;

impl DragTarget for Ignore {
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

fn event(change: PointerChange, position: Point, delta: Vec2, ms: u64) -> PointerEvent {
    PointerEvent::new(P, change, position)
        .with_kind(PointerKind::Touch)
        .with_buttons(Buttons::PRIMARY)
        .with_delta(delta)
        .with_time_stamp(Duration::from_millis(ms))
}

proptest! {
    #[test]
    fn only_the_move_leaving_the_slop_claims(
        steps in prop::collection::vec((-2_i8..=2, -2_i8..=2), 0..7),
    ) {
        let starts = Rc::new(Cell::new(0_u32));
        let mut g = Gestures::new();
        let counter = starts.clone();
        let drag = g.register(DragGestureRecognizer::new().on_start(move |_| {
            counter.set(counter.get() + 1);
            Some(Box::new(Ignore) as Box<dyn DragTarget>)
        }));
        let tap = g.register(TapGestureRecognizer::new().on_tap(|| Ok(())));

        let origin = Point::new(100.0, 100.0);
        let down = event(PointerChange::Down, origin, Vec2::ZERO, 0);
        g.add_pointer(drag, &down).unwrap();
        g.add_pointer(tap, &down).unwrap();
        g.handle_event(&down);

        let mut position = origin;
        let mut ms = 0;
        for (dx, dy) in steps {
            let delta = Vec2::new(f64::from(dx), f64::from(dy));
            position += delta;
            ms += 8;
            g.handle_event(&event(PointerChange::Move, position, delta, ms));
            g.flush();
        }
        prop_assert!((position - origin).hypot() <= TOUCH_SLOP);
        prop_assert_eq!(g.arena().members(P), Some(&[drag, tap][..]));
        let pending = g
            .recognizer::<DragGestureRecognizer>(drag)
            .and_then(|d| d.pointer_state(P))
            .and_then(|s| s.pending_delta());
        prop_assert_eq!(pending, Some(position - origin));
        prop_assert_eq!(starts.get(), 0);

        let delta = Vec2::new(40.0, 0.0);
        position += delta;
        g.handle_event(&event(PointerChange::Move, position, delta, ms + 8));
        g.flush();
        prop_assert!(!g.arena().has_arena(P));
        prop_assert_eq!(starts.get(), 1);
        prop_assert!(g.router().has_route(P, drag));
        prop_assert_eq!(
            g.recognizer::<TapGestureRecognizer>(tap).map(TapGestureRecognizer::state),
            Some(GestureRecognizerState::Defunct)
        );

        g.handle_event(&event(PointerChange::Move, position + delta, delta, ms + 16));
        g.flush();
        prop_assert_eq!(starts.get(), 1);
    }

    #[test]
    fn release_inside_the_slop_is_a_tap(
        steps in prop::collection::vec((-2_i8..=2, -2_i8..=2), 0..7),
    ) {
        let starts = Rc::new(Cell::new(0_u32));
        let taps = Rc::new(Cell::new(0_u32));
        let mut g = Gestures::new();
        let counter = starts.clone();
        let drag = g.register(DragGestureRecognizer::new().on_start(move |_| {
            counter.set(counter.get() + 1);
            Some(Box::new(Ignore) as Box<dyn DragTarget>)
        }));
        let tapped = taps.clone();
        let tap = g.register(TapGestureRecognizer::new().on_tap(move || {
            tapped.set(tapped.get() + 1);
            Ok(())
        }));

        let origin = Point::new(100.0, 100.0);
        let down = event(PointerChange::Down, origin, Vec2::ZERO, 0);
        g.add_pointer(drag, &down).unwrap();
        g.add_pointer(tap, &down).unwrap();
        g.handle_event(&down);

        let mut position = origin;
        let mut ms = 0;
        for (dx, dy) in steps {
            let delta = Vec2::new(f64::from(dx), f64::from(dy));
            position += delta;
            ms += 8;
            g.handle_event(&event(PointerChange::Move, position, delta, ms));
        }
        let up = event(PointerChange::Up, position, Vec2::ZERO, ms + 8)
            .with_buttons(Buttons::empty());
        g.handle_event(&up);
        g.flush();

        prop_assert_eq!(taps.get(), 1);
        prop_assert_eq!(starts.get(), 0);
        prop_assert!(g.arena().is_empty());
        prop_assert!(g.router().is_empty());
        prop_assert_eq!(
            g.recognizer::<DragGestureRecognizer>(drag).map(|d| d.pointer_count()),
            Some(0)
        );
    }
}
