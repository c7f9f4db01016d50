// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pointer event routing.
//!
//! ## Overview
//!
//! After hit testing has decided who is interested in a pointer, the interested
//! parties (usually gesture recognizers) register a route for that pointer with
//! a [`PointerRouter`]. Every subsequent event for the pointer is delivered to
//! each route, localized by the transform captured at registration time.
//!
//! ## Delivery rules
//!
//! - Routes for one pointer are delivered in registration order, followed by
//!   global routes.
//! - A route removed while an event is being delivered is not invoked for the
//!   rest of that event.
//! - A route added while an event is being delivered first sees the next event,
//!   unless it replaces a route that was removed during the same delivery and
//!   has not been invoked yet; that route is invoked with the new transform.
//! - A handler error is logged and does not stop delivery to the other routes.
//!
//! Handlers are plain keys `H`; the caller owns the actual handler objects and
//! resolves keys in the delivery callback, which also receives the router so a
//! handler can add or remove routes.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Affine;
use understory_pointer::{PointerEvent, PointerId};

type RouteList<H> = Vec<(H, Option<Affine>)>;

/// Routes pointer events to the handlers registered for their pointer.
#[derive(Clone, Debug)]
pub struct PointerRouter<H> {
    routes: HashMap<PointerId, RouteList<H>>,
    global_routes: RouteList<H>,
}

impl<H> Default for PointerRouter<H> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            global_routes: Vec::new(),
        }
    }
}

impl<H: Copy + Eq + fmt::Debug> PointerRouter<H> {
    /// Create a router without routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route events for `pointer` to `handler`, localized by `transform`.
    ///
    /// # Panics
    ///
    /// Panics if `handler` already has a route for `pointer`.
    pub fn add_route(&mut self, pointer: PointerId, handler: H, transform: Option<Affine>) {
        let routes = self.routes.entry(pointer).or_default();
        assert!(
            !routes.iter().any(|(h, _)| *h == handler),
            "{handler:?} already routed for pointer {pointer}"
        );
        routes.push((handler, transform));
    }

    /// Stop routing events for `pointer` to `handler`.
    ///
    /// # Panics
    ///
    /// Panics if there is no such route.
    pub fn remove_route(&mut self, pointer: PointerId, handler: H) {
        let routes = self.routes.get_mut(&pointer);
        let Some(routes) = routes else {
            panic!("no routes for pointer {pointer} when removing {handler:?}");
        };
        let Some(index) = routes.iter().position(|(h, _)| *h == handler) else {
            panic!("{handler:?} is not routed for pointer {pointer}");
        };
        routes.remove(index);
        if routes.is_empty() {
            self.routes.remove(&pointer);
        }
    }

    /// Route events for every pointer to `handler`, localized by `transform`.
    ///
    /// # Panics
    ///
    /// Panics if `handler` is already a global route.
    pub fn add_global_route(&mut self, handler: H, transform: Option<Affine>) {
        assert!(
            !self.global_routes.iter().any(|(h, _)| *h == handler),
            "{handler:?} is already a global route"
        );
        self.global_routes.push((handler, transform));
    }

    /// Remove a global route.
    ///
    /// # Panics
    ///
    /// Panics if `handler` is not a global route.
    pub fn remove_global_route(&mut self, handler: H) {
        let Some(index) = self.global_routes.iter().position(|(h, _)| *h == handler) else {
            panic!("{handler:?} is not a global route");
        };
        self.global_routes.remove(index);
    }

    /// Whether `handler` has a route for `pointer`.
    pub fn has_route(&self, pointer: PointerId, handler: H) -> bool {
        self.routes
            .get(&pointer)
            .is_some_and(|r| r.iter().any(|(h, _)| *h == handler))
    }

    /// Number of routes registered for `pointer`, not counting global routes.
    pub fn route_count(&self, pointer: PointerId) -> usize {
        self.routes.get(&pointer).map_or(0, Vec::len)
    }

    /// Whether no routes at all are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.global_routes.is_empty()
    }

    /// Deliver `event` to every route for its pointer, then to the global routes.
    ///
    /// `deliver` is called with the router, the handler key, and the event
    /// localized for that route.
    pub fn route<E, F>(&mut self, event: &PointerEvent, mut deliver: F)
    where
        E: fmt::Display,
        F: FnMut(&mut Self, H, &PointerEvent) -> Result<(), E>,
    {
        let pointer = event.pointer;
        let handlers: Vec<H> = self
            .routes
            .get(&pointer)
            .map(|r| r.iter().map(|(h, _)| *h).collect())
            .unwrap_or_default();
        for handler in handlers {
            let Some(transform) = self.route_transform(pointer, handler) else {
                continue;
            };
            self.dispatch(&mut deliver, handler, &event.transformed(transform));
        }
        let global: Vec<H> = self.global_routes.iter().map(|(h, _)| *h).collect();
        for handler in global {
            let live = self.global_routes.iter().find(|(h, _)| *h == handler);
            let Some(&(_, transform)) = live else {
                continue;
            };
            self.dispatch(&mut deliver, handler, &event.transformed(transform));
        }
    }

    /// The transform currently registered for `handler`'s route on `pointer`.
    fn route_transform(&self, pointer: PointerId, handler: H) -> Option<Option<Affine>> {
        self.routes
            .get(&pointer)?
            .iter()
            .find(|(h, _)| *h == handler)
            .map(|(_, t)| *t)
    }

    fn dispatch<E, F>(&mut self, deliver: &mut F, handler: H, event: &PointerEvent)
    where
        E: fmt::Display,
        F: FnMut(&mut Self, H, &PointerEvent) -> Result<(), E>,
    {
        if let Err(err) = deliver(self, handler, event) {
            tracing::warn!(
                pointer = %event.pointer,
                handler = ?handler,
                error = %err,
                "pointer route handler failed"
            );
        }
    }
}
