// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Gesture: deciding which recognizer owns a pointer.
//!
//! ## Overview
//!
//! Several recognizers often watch the same pointer: a button wants a tap,
//! the list around it wants a drag. This crate runs the arbitration between
//! them. Every interested recognizer joins the pointer's *arena*; as the
//! pointer moves, recognizers claim it or give up on it, and the
//! [`GestureArenaManager`] makes sure exactly one of them wins.
//!
//! ## Pieces
//!
//! - [`GestureArenaManager`]: the arbitration protocol (add, close, sweep,
//!   hold, release, resolve).
//! - [`GestureRecognizer`]: the capability a recognizer implements, built from
//!   [`ArenaMember`] and [`PointerEventSink`]. [`PointerTracker`] and
//!   [`PrimaryPointerState`] are building blocks for new recognizers.
//! - [`TapGestureRecognizer`] and [`DragGestureRecognizer`]: the bundled recognizers.
//! - [`VelocityTracker`]: release velocity from recent positions, fitted with
//!   [`LeastSquaresSolver`].
//! - [`Scheduler`] and [`TaskQueue`]: microtasks and deadline timers.
//! - [`Gestures`]: the host that owns recognizers and delivers arena decisions.
//! - [`GestureBinding`]: raw platform events in, gesture callbacks out.
//!
//! ## Errors
//!
//! Callbacks and drag targets report failures as [`GestureError`]. These are
//! logged through `tracing` where the host delivers events and never stop
//! delivery to other recognizers. Breaking the arena protocol (resolving an
//! arena that no longer exists, joining a closed arena, tracking a pointer
//! twice) panics.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod arena;
mod binding;
mod constants;
mod drag;
mod error;
mod host;
mod recognizer;
mod scheduler;
mod settings;
mod tap;
mod velocity;

pub use arena::{
    ArenaDecision, ArenaState, GestureArenaEntry, GestureArenaManager, GestureDisposition,
};
pub use binding::GestureBinding;
pub use constants::{
    MAX_FLING_VELOCITY, MIN_FLING_VELOCITY, PAN_SLOP, PRECISE_POINTER_HIT_SLOP,
    PRECISE_POINTER_PAN_SLOP, PRESS_TIMEOUT, TOUCH_SLOP,
};
pub use drag::{
    DragDetails, DragGestureRecognizer, DragPointerState, DragSlop, DragStartCallback, DragTarget,
};
pub use error::{GestureError, GestureResult};
pub use host::Gestures;
pub use recognizer::{
    ArenaMember, GestureContext, GestureFilter, GestureRecognizer, GestureRecognizerState,
    PointerEventSink, PointerTracker, PrimaryPointerState, PrimaryStep, RecognizerId,
};
pub use scheduler::{GestureTask, Scheduler, TaskHandle, TaskQueue};
pub use settings::{DeviceGestureSettings, compute_hit_slop, compute_pan_slop};
pub use tap::{
    TapButton, TapCallback, TapCallbacks, TapDownCallback, TapDownDetails, TapGestureRecognizer,
    TapUpCallback, TapUpDetails,
};
pub use velocity::{LeastSquaresSolver, PolynomialFit, Velocity, VelocityEstimate, VelocityTracker};
