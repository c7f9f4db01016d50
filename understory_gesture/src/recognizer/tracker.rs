// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use kurbo::Affine;
use understory_pointer::{PointerEvent, PointerId};

use super::{GestureContext, RecognizerId};
use crate::arena::{GestureArenaEntry, GestureDisposition};

/// Routes and arena entries of the pointers a recognizer is tracking.
///
/// Tracking a pointer registers a route for it and joins its arena. The
/// entry is kept until the recognizer resolves it or the arena notifies the
/// recognizer, whichever comes first; the owning recognizer calls
/// [`forget_entry`](Self::forget_entry) from its arena callbacks.
#[derive(Debug, Default)]
pub struct PointerTracker {
    entries: Vec<(PointerId, GestureArenaEntry<RecognizerId>)>,
    tracked: Vec<PointerId>,
}

impl PointerTracker {
    /// Create a tracker with no pointers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `pointer` to the recognizer and join its arena.
    ///
    /// # Panics
    ///
    /// Panics if `pointer` is already tracked.
    pub fn start_tracking(
        &mut self,
        cx: &mut GestureContext<'_>,
        pointer: PointerId,
        transform: Option<Affine>,
    ) {
        assert!(
            !self.is_tracking(pointer),
            "pointer {pointer} is already tracked by {}",
            cx.id()
        );
        cx.add_route(pointer, transform);
        self.tracked.push(pointer);
        let entry = cx.join_arena(pointer);
        self.entries.push((pointer, entry));
    }

    /// Stop routing `pointer` to the recognizer.
    ///
    /// Returns `true` when this was the last tracked pointer. The arena entry,
    /// if any, stays unresolved.
    pub fn stop_tracking(&mut self, cx: &mut GestureContext<'_>, pointer: PointerId) -> bool {
        let Some(index) = self.tracked.iter().position(|p| *p == pointer) else {
            return false;
        };
        cx.remove_route(pointer);
        self.tracked.remove(index);
        self.tracked.is_empty()
    }

    /// Stop tracking `event`'s pointer if the event ends its contact.
    ///
    /// Returns `true` when this was the last tracked pointer.
    pub fn stop_tracking_if_pointer_no_longer_down(
        &mut self,
        cx: &mut GestureContext<'_>,
        event: &PointerEvent,
    ) -> bool {
        if event.change.ends_contact() {
            self.stop_tracking(cx, event.pointer)
        } else {
            false
        }
    }

    /// Resolve every outstanding arena entry.
    pub fn resolve(&mut self, cx: &mut GestureContext<'_>, disposition: GestureDisposition) {
        for (_, entry) in core::mem::take(&mut self.entries) {
            cx.resolve(entry, disposition);
        }
    }

    /// Resolve the arena entry for `pointer`, if it is still outstanding.
    pub fn resolve_pointer(
        &mut self,
        cx: &mut GestureContext<'_>,
        pointer: PointerId,
        disposition: GestureDisposition,
    ) {
        if let Some(index) = self.entries.iter().position(|(p, _)| *p == pointer) {
            let (_, entry) = self.entries.remove(index);
            cx.resolve(entry, disposition);
        }
    }

    /// Drop the entry for `pointer` once its arena was decided.
    pub fn forget_entry(&mut self, pointer: PointerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(p, _)| *p != pointer);
        self.entries.len() != before
    }

    /// Reject every outstanding entry and remove every route.
    pub fn dispose(&mut self, cx: &mut GestureContext<'_>) {
        self.resolve(cx, GestureDisposition::Rejected);
        for pointer in core::mem::take(&mut self.tracked) {
            cx.remove_route(pointer);
        }
    }

    /// Whether `pointer` is routed to the recognizer.
    pub fn is_tracking(&self, pointer: PointerId) -> bool {
        self.tracked.contains(&pointer)
    }

    /// Number of tracked pointers.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Whether an unresolved arena entry is held for `pointer`.
    pub fn has_entry(&self, pointer: PointerId) -> bool {
        self.entries.iter().any(|(p, _)| *p == pointer)
    }
}
