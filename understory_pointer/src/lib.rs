// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Pointer: canonical pointer events for UI.
//!
//! ## Overview
//!
//! Platforms deliver pointer input that is close to, but not quite, a well-formed
//! stream: ups go missing behind context menus, buttons appear on moves before the
//! matching down, touch contacts vanish without a removal, and cancellations report
//! meaningless coordinates. This crate turns such raw input into a canonical stream
//! of [`PointerEvent`]s that downstream consumers (hit testing, routing, gesture
//! recognition) can rely on.
//!
//! ## Pieces
//!
//! - [`RawPointerEvent`]: input as the platform reports it (DOM `PointerEvent` shaped).
//! - [`ButtonSanitizer`]: per-device pressed-button bookkeeping that classifies each
//!   raw event into a canonical [`PointerChange`].
//! - [`PointerEventSanitizer`]: per-device position and contact state; emits the
//!   canonical events, synthesizing `Added`, `Hover`, `Move`, and `Removed` events
//!   where the platform left gaps.
//! - [`SanitizerContext`]: pointer id allocation, shared across sanitizers.
//! - [`PointerEvent`]: the canonical event, with global, local, and physical values.
//!   [`PointerEvent::transformed`] localizes an event for a consumer in a
//!   transformed coordinate space.
//!
//! ## Guarantees
//!
//! Per device, the emitted stream is a prefix of
//! `Added, (Hover | Down Move* (Up | Cancel))*, Removed`, a `Down` never carries
//! motion, and every `Down` starts a new [`PointerId`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod buttons;
mod event;
mod raw;
mod sanitizer;
mod types;

pub use buttons::{ButtonSanitizer, ButtonTransition};
pub use event::PointerEvent;
pub use raw::{RawEventType, RawPointerEvent};
pub use sanitizer::{PointerEventSanitizer, PointerState, SanitizerConfig, SanitizerContext};
pub use types::{Buttons, DeviceId, DeviceKinds, PointerChange, PointerId, PointerKind};
