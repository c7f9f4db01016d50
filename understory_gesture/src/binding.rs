// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! From raw platform input to gesture callbacks.
//!
//! ## Overview
//!
//! [`GestureBinding`] is the entry point for an embedder. It sanitizes raw
//! pointer events, hit tests the scene on down and hover, delivers each event
//! along the hit-test path, and finally hands it to the [`Gestures`] host,
//! which routes it to recognizers and closes or sweeps the pointer's arena.
//!
//! The scene implements [`HitTestable`] to report what is under a position
//! and [`HitTestTarget`] to receive events. A target typically offers a down
//! event to its recognizers with [`Gestures::add_pointer`]:
//!
//! ```
//! use kurbo::Point;
//! use understory_gesture::{GestureBinding, GestureError, Gestures, RecognizerId};
//! use understory_gesture::TapGestureRecognizer;
//! use understory_pointer::{
//!     PointerChange, PointerEvent, PointerKind, RawEventType, RawPointerEvent,
//! };
//! use understory_responder::{HitTestEntry, HitTestResult, HitTestTarget, HitTestable};
//!
//! struct Button(RecognizerId);
//!
//! impl HitTestable<u32> for Button {
//!     fn hit_test(&self, result: &mut HitTestResult<u32>, position: Point) {
//!         if position.x < 100.0 {
//!             result.add(HitTestEntry::new(1));
//!         }
//!     }
//! }
//!
//! impl HitTestTarget<u32, Gestures> for Button {
//!     type Error = GestureError;
//!     fn handle_event(
//!         &mut self,
//!         gestures: &mut Gestures,
//!         event: &PointerEvent,
//!         _entry: &HitTestEntry<u32>,
//!     ) -> Result<(), GestureError> {
//!         if event.change == PointerChange::Down {
//!             gestures.add_pointer(self.0, event)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut binding = GestureBinding::new();
//! let tap = binding
//!     .gestures_mut()
//!     .register(TapGestureRecognizer::new().on_tap(|| Ok(())));
//! let mut scene = Button(tap);
//! let raw = |event_type, x| {
//!     RawPointerEvent::new(event_type, 1, PointerKind::Touch, Point::new(x, 0.0))
//! };
//! binding.handle_raw_event(&raw(RawEventType::Down, 10.0), &mut scene);
//! binding.handle_raw_event(&raw(RawEventType::Up, 10.0), &mut scene);
//! assert!(binding.gestures().router().is_empty());
//! ```

use alloc::rc::Rc;

use hashbrown::HashMap;
use understory_pointer::{
    PointerChange, PointerEvent, PointerEventSanitizer, PointerId, RawPointerEvent,
    SanitizerContext,
};
use understory_responder::{
    HitTestEntry, HitTestResult, HitTestTarget, HitTestable, dispatch_to_path,
};

use crate::host::Gestures;

type Path<K> = Rc<[HitTestEntry<K>]>;

/// Connects a [`PointerEventSanitizer`], hit testing and a [`Gestures`] host.
pub struct GestureBinding<K> {
    sanitizer: PointerEventSanitizer,
    context: SanitizerContext,
    hit_tests: HashMap<PointerId, Path<K>>,
    gestures: Gestures,
}

impl<K> core::fmt::Debug for GestureBinding<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GestureBinding")
            .field("sanitizer", &self.sanitizer)
            .field("context", &self.context)
            .field("hit_tests", &self.hit_tests.len())
            .field("gestures", &self.gestures)
            .finish()
    }
}

impl<K> Default for GestureBinding<K> {
    fn default() -> Self {
        Self::with_gestures(Gestures::new())
    }
}

impl<K> GestureBinding<K> {
    /// Create a binding with a default sanitizer and host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a binding around an existing host.
    pub fn with_gestures(gestures: Gestures) -> Self {
        Self {
            sanitizer: PointerEventSanitizer::new(),
            context: SanitizerContext::new(),
            hit_tests: HashMap::new(),
            gestures,
        }
    }

    /// Use `sanitizer` for raw events.
    pub fn with_sanitizer(mut self, sanitizer: PointerEventSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// The gesture host.
    pub fn gestures(&self) -> &Gestures {
        &self.gestures
    }

    /// The gesture host, for registering and disposing recognizers.
    pub fn gestures_mut(&mut self) -> &mut Gestures {
        &mut self.gestures
    }

    /// The sanitizer.
    pub fn sanitizer(&self) -> &PointerEventSanitizer {
        &self.sanitizer
    }

    /// The sanitizer, for changing its device pixel ratio.
    pub fn sanitizer_mut(&mut self) -> &mut PointerEventSanitizer {
        &mut self.sanitizer
    }

    /// Whether a hit-test result is remembered for `pointer`.
    pub fn is_pointer_hit(&self, pointer: PointerId) -> bool {
        self.hit_tests.contains_key(&pointer)
    }

    /// Handle a raw platform event.
    ///
    /// The clock advances to the event's time stamp first, so deadlines that
    /// elapsed before the event run before it. Microtasks run after it.
    pub fn handle_raw_event<H>(&mut self, raw: &RawPointerEvent, host: &mut H)
    where
        H: HitTestable<K> + HitTestTarget<K, Gestures>,
    {
        self.gestures.advance_to(raw.time_stamp);
        let events = self.sanitizer.sanitize(raw, &mut self.context);
        for event in &events {
            self.handle_pointer_event(event, host);
        }
        self.gestures.flush();
    }

    /// Handle one canonical event.
    ///
    /// Down and hover events are hit tested at their position; the result of
    /// a down is remembered until the pointer goes up or is cancelled and is
    /// reused for its moves. Added and removed events without a result only
    /// go to the recognizers.
    pub fn handle_pointer_event<H>(&mut self, event: &PointerEvent, host: &mut H)
    where
        H: HitTestable<K> + HitTestTarget<K, Gestures>,
    {
        let path = match event.change {
            PointerChange::Down | PointerChange::Hover => {
                let mut result = HitTestResult::new();
                host.hit_test(&mut result, event.position);
                let path: Path<K> = result.into_path().into();
                if event.change == PointerChange::Down {
                    self.hit_tests.insert(event.pointer, path.clone());
                }
                Some(path)
            }
            PointerChange::Up | PointerChange::Cancel => self.hit_tests.remove(&event.pointer),
            _ if event.down => self.hit_tests.get(&event.pointer).cloned(),
            _ => None,
        };
        let unrouted = matches!(event.change, PointerChange::Added | PointerChange::Removed);
        if path.is_some() || unrouted {
            self.dispatch_event(event, path.as_deref(), host);
        }
    }

    /// Deliver `event` along `path`, then to the gesture host.
    ///
    /// Without a path the event only goes to the recognizers.
    pub fn dispatch_event<H>(
        &mut self,
        event: &PointerEvent,
        path: Option<&[HitTestEntry<K>]>,
        host: &mut H,
    ) where
        H: HitTestTarget<K, Gestures>,
    {
        let Some(path) = path else {
            debug_assert!(
                matches!(event.change, PointerChange::Added | PointerChange::Removed),
                "only added and removed events are dispatched without a hit test"
            );
            self.gestures.route(event);
            return;
        };
        dispatch_to_path(host, &mut self.gestures, path, event);
        self.gestures.handle_event(event);
    }

    /// Cancel a pointer that is currently down, as if the platform had
    /// reported a cancel.
    pub fn cancel_pointer<H>(&mut self, pointer: PointerId, host: &mut H)
    where
        H: HitTestable<K> + HitTestTarget<K, Gestures>,
    {
        let events = self.sanitizer.cancel_pointer(pointer, self.gestures.now());
        if events.is_empty() {
            tracing::trace!(pointer = %pointer, "cancel for a pointer that is not down");
        }
        for event in &events {
            self.handle_pointer_event(event, host);
        }
        self.gestures.flush();
    }
}
