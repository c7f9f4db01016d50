// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Responder: hit-test results and pointer routing for UI events.
//!
//! ## Overview
//!
//! This crate sits between a canonical pointer stream (see `understory_pointer`)
//! and the code that reacts to it. It does not perform hit testing itself.
//! Instead, a scene implementing [`HitTestable`] fills a [`HitTestResult`] with
//! the nodes under a position, and the crate takes care of the two things that
//! happen around that:
//!
//! - **Transforms.** Each [`HitTestEntry`] is stamped with the global → local
//!   transform in force when it was added. Transforms are composed lazily so a
//!   scene can push and pop freely while descending.
//! - **Routing.** Handlers interested in a pointer beyond the initial hit (for
//!   example gesture recognizers tracking a drag) register with a
//!   [`PointerRouter`], which delivers each later event for that pointer,
//!   localized, to every route in registration order.
//!
//! ## Errors
//!
//! Handler failures never propagate out of dispatch. [`dispatch_to_path`] and
//! [`PointerRouter::route`] log them at `warn` through `tracing` and carry on
//! with the remaining handlers. Protocol misuse (adding an entry twice, routing a
//! handler twice, removing a missing route, popping an empty transform stack)
//! panics.
//!
//! ## Workflow
//!
//! 1) On `Down` (and `Hover`), call [`HitTestable::hit_test`] with a fresh
//!    [`HitTestResult`] at the event's global position and keep the result for
//!    the pointer.
//! 2) Dispatch each event of the contact to the remembered path with
//!    [`dispatch_to_path`]; targets receive the event already localized.
//! 3) Targets that want the rest of the stream add a route to a
//!    [`PointerRouter`] and remove it when done.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod dispatcher;

pub use dispatcher::PointerRouter;
pub use hit_test::{
    HitTestEntry, HitTestResult, HitTestTarget, HitTestable, TransformPart, dispatch_to_path,
};
