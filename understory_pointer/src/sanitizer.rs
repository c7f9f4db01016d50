// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pointer event sanitizer.
//!
//! ## Canonical stream
//!
//! For every device the emitted sequence is a prefix of
//! `Added, (Hover | Down Move* (Up | Cancel))*, Removed`:
//!
//! - The first event ever seen from a device is preceded by a synthesized `Added`.
//! - A `Down` at a position other than the last known one is preceded by a
//!   synthesized `Hover` to that position, so `Down` never carries motion.
//! - An `Up` at a new position is preceded by a synthesized `Move`.
//! - A `Cancel` is reported at the last known position; its own coordinates are
//!   ignored because platforms often report garbage on cancellation.
//! - Touch contacts do not persist: after their `Up` or `Cancel` (or a dropped
//!   duplicate up) a `Removed` is synthesized and the device state is discarded.
//!
//! Synthesized events are flagged with [`PointerEvent::synthesized`] and are
//! always emitted before the event derived from the raw input.
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use understory_pointer::{
//!     Buttons, PointerChange, PointerEventSanitizer, PointerKind, RawEventType, RawPointerEvent,
//!     SanitizerContext,
//! };
//!
//! let mut cx = SanitizerContext::new();
//! let mut sanitizer = PointerEventSanitizer::new();
//!
//! let down = RawPointerEvent::new(RawEventType::Down, 7, PointerKind::Touch, Point::new(5.0, 5.0))
//!     .with_buttons(Buttons::PRIMARY)
//!     .with_button(0);
//! let up = RawPointerEvent::new(RawEventType::Up, 7, PointerKind::Touch, Point::new(5.0, 5.0));
//!
//! let mut changes = Vec::new();
//! for raw in [down, up] {
//!     changes.extend(sanitizer.sanitize(&raw, &mut cx).into_iter().map(|e| e.change));
//! }
//! assert_eq!(
//!     changes,
//!     [PointerChange::Added, PointerChange::Down, PointerChange::Up, PointerChange::Removed]
//! );
//! ```

use alloc::vec::Vec;
use core::time::Duration;

use hashbrown::HashMap;
use kurbo::Point;

use crate::buttons::{ButtonSanitizer, ButtonTransition};
use crate::event::PointerEvent;
use crate::raw::{RawEventType, RawPointerEvent};
use crate::types::{Buttons, DeviceId, PointerChange, PointerId, PointerKind};

/// Sanitizer configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SanitizerConfig {
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f64,
    /// Virtual device id all mouse input is folded onto.
    pub mouse_device_id: DeviceId,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            mouse_device_id: DeviceId(-1),
        }
    }
}

/// Allocation state shared by the sanitizers of one input pipeline.
///
/// Pointer ids come from here so that several sanitizers (for example one per
/// window) can share a single id space.
#[derive(Clone, Debug, Default)]
pub struct SanitizerContext {
    last_pointer: u32,
}

impl SanitizerContext {
    /// Create a context that has not allocated any pointer id yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next pointer id.
    pub fn next_pointer_id(&mut self) -> PointerId {
        self.last_pointer = self.last_pointer.wrapping_add(1);
        PointerId(self.last_pointer)
    }

    /// The most recently allocated pointer id, if any.
    pub fn last_pointer_id(&self) -> Option<PointerId> {
        (self.last_pointer != 0).then_some(PointerId(self.last_pointer))
    }
}

/// What the sanitizer remembers about one device between events.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerState {
    /// Current contact id.
    pub pointer: PointerId,
    /// Kind of the device.
    pub kind: PointerKind,
    /// Last emitted position in logical pixels.
    pub position: Point,
    /// Last emitted buttons.
    pub buttons: Buttons,
    /// Whether the device is in contact.
    pub down: bool,
    /// Device pixel ratio used for the last emitted event.
    pub device_pixel_ratio: f64,
    // Whether `pointer` has already been used by a `Down`.
    contact_started: bool,
}

impl PointerState {
    fn new(
        pointer: PointerId,
        kind: PointerKind,
        position: Point,
        device_pixel_ratio: f64,
    ) -> Self {
        Self {
            pointer,
            kind,
            position,
            buttons: Buttons::empty(),
            down: false,
            device_pixel_ratio,
            contact_started: false,
        }
    }

    fn start_contact(&mut self, cx: &mut SanitizerContext) {
        if self.contact_started {
            self.pointer = cx.next_pointer_id();
        }
        self.contact_started = true;
        self.down = true;
    }

    fn event(
        &mut self,
        device: DeviceId,
        change: PointerChange,
        position: Point,
        buttons: Buttons,
        time_stamp: Duration,
        synthesized: bool,
    ) -> PointerEvent {
        let delta = position - self.position;
        self.position = position;
        self.buttons = buttons;
        let dpr = self.device_pixel_ratio;
        PointerEvent {
            pointer: self.pointer,
            device,
            kind: self.kind,
            change,
            time_stamp,
            position,
            delta,
            local_position: position,
            local_delta: delta,
            physical_position: (position.to_vec2() * dpr).to_point(),
            physical_delta: delta * dpr,
            buttons,
            down: self.down,
            synthesized,
            transform: None,
        }
    }
}

/// Turns raw platform pointer input into a canonical event stream.
///
/// See the [module documentation](self) for the guarantees on the output.
#[derive(Clone, Debug, Default)]
pub struct PointerEventSanitizer {
    config: SanitizerConfig,
    states: HashMap<DeviceId, PointerState>,
    buttons: HashMap<DeviceId, ButtonSanitizer>,
}

impl PointerEventSanitizer {
    /// Create a sanitizer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sanitizer with an explicit configuration.
    pub fn with_config(config: SanitizerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Update the device pixel ratio used for physical coordinates of subsequent events.
    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f64) {
        self.config.device_pixel_ratio = device_pixel_ratio;
    }

    /// The device a raw event belongs to.
    pub fn device_of(&self, raw: &RawPointerEvent) -> DeviceId {
        match raw.pointer_type {
            PointerKind::Mouse => self.config.mouse_device_id,
            _ => DeviceId(raw.pointer_id),
        }
    }

    /// State of a known device.
    pub fn state(&self, device: DeviceId) -> Option<&PointerState> {
        self.states.get(&device)
    }

    /// The device currently in contact under `pointer`, if any.
    pub fn device_for_pointer(&self, pointer: PointerId) -> Option<DeviceId> {
        self.states
            .iter()
            .find(|(_, s)| s.down && s.pointer == pointer)
            .map(|(d, _)| *d)
    }

    /// Number of devices currently tracked.
    pub fn device_count(&self) -> usize {
        self.states.len()
    }

    /// Sanitize one raw event into zero or more canonical events.
    pub fn sanitize(
        &mut self,
        raw: &RawPointerEvent,
        cx: &mut SanitizerContext,
    ) -> Vec<PointerEvent> {
        let device = self.device_of(raw);
        let mut out = Vec::new();
        match raw.event_type {
            RawEventType::Down => {
                let tracker = self.buttons.entry(device).or_default();
                let up = tracker.sanitize_missing_up(raw.buttons);
                let down = tracker.sanitize_down(raw.button, raw.buttons);
                if let Some(up) = up {
                    self.convert(&mut out, cx, device, raw, up);
                }
                self.convert(&mut out, cx, device, raw, down);
            }
            RawEventType::Move => {
                let tracker = self.buttons.entry(device).or_default();
                let up = tracker.sanitize_missing_up(raw.buttons);
                let moved = tracker.sanitize_move(raw.buttons);
                if let Some(up) = up {
                    self.convert(&mut out, cx, device, raw, up);
                }
                self.convert(&mut out, cx, device, raw, moved);
            }
            RawEventType::Up | RawEventType::Cancel => {
                let Some(tracker) = self.buttons.get_mut(&device) else {
                    tracing::trace!(device = device.0, "release from unknown device dropped");
                    return out;
                };
                let transition = if raw.event_type == RawEventType::Cancel {
                    (!tracker.pressed().is_empty()).then(|| tracker.sanitize_cancel())
                } else {
                    tracker.sanitize_up(raw.buttons)
                };
                if raw.pointer_type.is_transient() {
                    self.buttons.remove(&device);
                }
                match transition {
                    Some(transition) => self.convert(&mut out, cx, device, raw, transition),
                    None => {
                        tracing::trace!(device = device.0, "release with nothing pressed dropped");
                    }
                }
                if raw.pointer_type.is_transient() {
                    self.remove_device(&mut out, device, raw.time_stamp);
                }
            }
        }
        out
    }

    /// Synthesize a cancellation for the contact `pointer`.
    ///
    /// Returns no events when `pointer` is not currently down. Touch devices are
    /// removed afterwards, as for a platform cancel.
    pub fn cancel_pointer(
        &mut self,
        pointer: PointerId,
        time_stamp: Duration,
    ) -> Vec<PointerEvent> {
        let mut out = Vec::new();
        let Some(device) = self.device_for_pointer(pointer) else {
            return out;
        };
        let transient = self.states.get(&device).is_some_and(|s| s.kind.is_transient());
        if let Some(tracker) = self.buttons.get_mut(&device) {
            let _ = tracker.sanitize_cancel();
        }
        if let Some(state) = self.states.get_mut(&device) {
            state.down = false;
            let position = state.position;
            out.push(state.event(
                device,
                PointerChange::Cancel,
                position,
                Buttons::empty(),
                time_stamp,
                true,
            ));
        }
        if transient {
            self.buttons.remove(&device);
            self.remove_device(&mut out, device, time_stamp);
        }
        out
    }

    fn ensure_state<'a>(
        states: &'a mut HashMap<DeviceId, PointerState>,
        out: &mut Vec<PointerEvent>,
        cx: &mut SanitizerContext,
        device: DeviceId,
        raw: &RawPointerEvent,
        device_pixel_ratio: f64,
    ) -> &'a mut PointerState {
        let state = states.entry(device).or_insert_with(|| {
            let mut state = PointerState::new(
                cx.next_pointer_id(),
                raw.pointer_type,
                raw.position,
                device_pixel_ratio,
            );
            out.push(state.event(
                device,
                PointerChange::Added,
                raw.position,
                Buttons::empty(),
                raw.time_stamp,
                true,
            ));
            state
        });
        state.device_pixel_ratio = device_pixel_ratio;
        state
    }

    fn convert(
        &mut self,
        out: &mut Vec<PointerEvent>,
        cx: &mut SanitizerContext,
        device: DeviceId,
        raw: &RawPointerEvent,
        transition: ButtonTransition,
    ) {
        let dpr = self.config.device_pixel_ratio;
        let time = raw.time_stamp;
        match transition.change {
            PointerChange::Hover => {
                let state = Self::ensure_state(&mut self.states, out, cx, device, raw, dpr);
                out.push(state.event(
                    device,
                    PointerChange::Hover,
                    raw.position,
                    transition.buttons,
                    time,
                    false,
                ));
            }
            PointerChange::Down => {
                let state = Self::ensure_state(&mut self.states, out, cx, device, raw, dpr);
                assert!(!state.down, "down for device {} that is already down", device.0);
                if state.position != raw.position {
                    out.push(state.event(
                        device,
                        PointerChange::Hover,
                        raw.position,
                        Buttons::empty(),
                        time,
                        true,
                    ));
                }
                state.start_contact(cx);
                out.push(state.event(
                    device,
                    PointerChange::Down,
                    raw.position,
                    transition.buttons,
                    time,
                    false,
                ));
            }
            PointerChange::Move => {
                let state = self.states.get_mut(&device);
                let Some(state) = state.filter(|s| s.down) else {
                    panic!("move for device {} that is not down", device.0);
                };
                out.push(state.event(
                    device,
                    PointerChange::Move,
                    raw.position,
                    transition.buttons,
                    time,
                    false,
                ));
            }
            PointerChange::Up | PointerChange::Cancel => {
                let state = self.states.get_mut(&device);
                let Some(state) = state.filter(|s| s.down) else {
                    panic!("release for device {} that is not down", device.0);
                };
                let position = if transition.change == PointerChange::Cancel {
                    state.position
                } else {
                    raw.position
                };
                if state.position != position {
                    let held = state.buttons;
                    out.push(state.event(device, PointerChange::Move, position, held, time, true));
                }
                state.down = false;
                out.push(state.event(
                    device,
                    transition.change,
                    position,
                    transition.buttons,
                    time,
                    false,
                ));
            }
            PointerChange::Added | PointerChange::Removed => {
                unreachable!("button transitions never add or remove devices")
            }
        }
    }

    fn remove_device(
        &mut self,
        out: &mut Vec<PointerEvent>,
        device: DeviceId,
        time_stamp: Duration,
    ) {
        let Some(mut state) = self.states.remove(&device) else {
            return;
        };
        let position = state.position;
        if state.down {
            state.down = false;
            out.push(state.event(
                device,
                PointerChange::Cancel,
                position,
                Buttons::empty(),
                time_stamp,
                true,
            ));
        }
        out.push(state.event(
            device,
            PointerChange::Removed,
            position,
            Buttons::empty(),
            time_stamp,
            true,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    fn raw(ty: RawEventType, kind: PointerKind, x: f64, buttons: Buttons) -> RawPointerEvent {
        RawPointerEvent::new(ty, 1, kind, Point::new(x, 0.0)).with_buttons(buttons)
    }

    fn changes(events: &[PointerEvent]) -> Vec<(PointerChange, bool)> {
        events.iter().map(|e| (e.change, e.synthesized)).collect()
    }

    fn run(
        sanitizer: &mut PointerEventSanitizer,
        cx: &mut SanitizerContext,
        input: &[RawPointerEvent],
    ) -> Vec<PointerEvent> {
        input.iter().flat_map(|r| sanitizer.sanitize(r, cx)).collect()
    }

    #[test]
    fn first_down_is_preceded_by_added() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let down = raw(RawEventType::Down, PointerKind::Mouse, 3.0, Buttons::PRIMARY);
        let out = s.sanitize(&down, &mut cx);
        assert_eq!(
            changes(&out),
            [(PointerChange::Added, true), (PointerChange::Down, false)]
        );
        assert!(out.iter().all(|e| e.pointer == out[0].pointer));
        assert_eq!(out[1].delta, Vec2::ZERO);
    }

    #[test]
    fn move_with_buttons_on_unseen_touch_device() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Move, PointerKind::Touch, 4.0, Buttons::PRIMARY),
                raw(RawEventType::Up, PointerKind::Touch, 4.0, Buttons::empty()),
            ],
        );
        assert_eq!(
            changes(&out),
            [
                (PointerChange::Added, true),
                (PointerChange::Hover, false),
                (PointerChange::Removed, true),
            ]
        );
        assert_eq!(s.device_count(), 0);
    }

    #[test]
    fn mouse_device_persists_after_up() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Down, PointerKind::Mouse, 0.0, Buttons::PRIMARY),
                raw(RawEventType::Up, PointerKind::Mouse, 0.0, Buttons::empty()),
            ],
        );
        assert_eq!(out.last().map(|e| e.change), Some(PointerChange::Up));
        assert_eq!(s.device_count(), 1);
        assert_eq!(out[0].device, DeviceId(-1));
    }

    #[test]
    fn down_at_new_location_synthesizes_hover() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Move, PointerKind::Mouse, 0.0, Buttons::empty()),
                raw(RawEventType::Down, PointerKind::Mouse, 10.0, Buttons::PRIMARY),
            ],
        );
        assert_eq!(
            changes(&out),
            [
                (PointerChange::Added, true),
                (PointerChange::Hover, false),
                (PointerChange::Hover, true),
                (PointerChange::Down, false),
            ]
        );
        assert_eq!(out[2].delta, Vec2::new(10.0, 0.0));
        assert_eq!(out[3].delta, Vec2::ZERO);
    }

    #[test]
    fn up_at_new_location_synthesizes_move() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Down, PointerKind::Mouse, 0.0, Buttons::PRIMARY),
                raw(RawEventType::Up, PointerKind::Mouse, 6.0, Buttons::empty()),
            ],
        );
        assert_eq!(
            changes(&out)[2..],
            [(PointerChange::Move, true), (PointerChange::Up, false)]
        );
        assert_eq!(out[2].buttons, Buttons::PRIMARY);
        assert!(out[2].down);
        assert!(!out[3].down);
    }

    #[test]
    fn cancel_ignores_reported_coordinates() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Down, PointerKind::Touch, 5.0, Buttons::PRIMARY),
                raw(RawEventType::Cancel, PointerKind::Touch, 0.0, Buttons::empty()),
            ],
        );
        assert_eq!(
            changes(&out),
            [
                (PointerChange::Added, true),
                (PointerChange::Down, false),
                (PointerChange::Cancel, false),
                (PointerChange::Removed, true),
            ]
        );
        assert_eq!(out[2].position, Point::new(5.0, 0.0));
    }

    #[test]
    fn missed_right_click_up_is_synthesized_on_next_down() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Down, PointerKind::Mouse, 0.0, Buttons::SECONDARY).with_button(2),
                // Context menu swallowed the up; the next move reports nothing pressed.
                raw(RawEventType::Move, PointerKind::Mouse, 0.0, Buttons::empty()),
            ],
        );
        assert_eq!(
            changes(&out)[2..],
            [(PointerChange::Up, false), (PointerChange::Hover, false)]
        );
    }

    #[test]
    fn second_button_press_is_move() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Down, PointerKind::Mouse, 0.0, Buttons::PRIMARY),
                raw(
                    RawEventType::Down,
                    PointerKind::Mouse,
                    0.0,
                    Buttons::PRIMARY | Buttons::SECONDARY,
                ),
            ],
        );
        assert_eq!(out[2].change, PointerChange::Move);
        assert_eq!(out[2].buttons, Buttons::PRIMARY | Buttons::SECONDARY);
    }

    #[test]
    fn each_contact_gets_a_fresh_pointer_id() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let click = [
            raw(RawEventType::Down, PointerKind::Mouse, 0.0, Buttons::PRIMARY),
            raw(RawEventType::Up, PointerKind::Mouse, 0.0, Buttons::empty()),
        ];
        let first = run(&mut s, &mut cx, &click);
        let second = run(&mut s, &mut cx, &click);
        assert_ne!(first[1].pointer, second[0].pointer);
        assert!(second[0].pointer > first[1].pointer);
    }

    #[test]
    fn physical_values_scale_with_device_pixel_ratio() {
        let mut s = PointerEventSanitizer::with_config(SanitizerConfig {
            device_pixel_ratio: 2.0,
            ..SanitizerConfig::default()
        });
        let mut cx = SanitizerContext::new();
        let out = run(
            &mut s,
            &mut cx,
            &[
                raw(RawEventType::Down, PointerKind::Mouse, 1.0, Buttons::PRIMARY),
                raw(RawEventType::Move, PointerKind::Mouse, 4.0, Buttons::PRIMARY),
            ],
        );
        let mv = out.last().unwrap();
        assert_eq!(mv.physical_position, Point::new(8.0, 0.0));
        assert_eq!(mv.physical_delta, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn up_from_unknown_device_is_ignored() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let up = raw(RawEventType::Up, PointerKind::Touch, 0.0, Buttons::empty());
        let out = s.sanitize(&up, &mut cx);
        assert!(out.is_empty());
    }

    #[test]
    fn cancel_pointer_synthesizes_cancel_and_removal() {
        let mut s = PointerEventSanitizer::new();
        let mut cx = SanitizerContext::new();
        let down = raw(RawEventType::Down, PointerKind::Touch, 2.0, Buttons::PRIMARY);
        let down = s.sanitize(&down, &mut cx);
        let pointer = down[1].pointer;
        let out = s.cancel_pointer(pointer, Duration::from_millis(5));
        assert_eq!(
            changes(&out),
            [(PointerChange::Cancel, true), (PointerChange::Removed, true)]
        );
        assert!(s.cancel_pointer(pointer, Duration::ZERO).is_empty());
    }
}
