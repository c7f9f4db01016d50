// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The gesture arena: deciding which recognizer owns a pointer.
//!
//! ## Overview
//!
//! Every recognizer interested in a pointer joins that pointer's arena and gets
//! a [`GestureArenaEntry`]. Members declare themselves winners or losers by
//! resolving their entry; the [`GestureArenaManager`] makes sure that, once the
//! arena is decided, exactly one member is accepted and every other member is
//! rejected, each exactly once.
//!
//! ## Lifecycle
//!
//! - **Open.** Created by the first [`add`](GestureArenaManager::add). Members
//!   may join. An accepting member is remembered as the eager winner but
//!   nothing is decided yet, since more members may join.
//! - **Closed.** After [`close`](GestureArenaManager::close) (on pointer down).
//!   The arena is decided as soon as possible:
//!   - a single remaining member wins by default, on the next microtask;
//!   - an eager winner wins immediately;
//!   - an arena without members is discarded.
//! - **Held.** [`hold`](GestureArenaManager::hold) defers a
//!   [`sweep`](GestureArenaManager::sweep) until
//!   [`release`](GestureArenaManager::release).
//! - **Swept.** On pointer up, an undecided arena is forced: the first member
//!   to have joined wins.
//!
//! ## Notifications
//!
//! The manager does not call members. It queues an [`ArenaDecision`] per
//! member, rejections before the acceptance, and the owner drains them with
//! [`take_decision`](GestureArenaManager::take_decision). This lets members
//! resolve further entries while handling a notification.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use understory_pointer::PointerId;

use crate::scheduler::{GestureTask, Scheduler};

bitflags::bitflags! {
    /// State bits of one arena.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ArenaState: u8 {
        /// Members may still join.
        const OPEN = 0b01;
        /// Sweeping is deferred until release.
        const HELD = 0b10;
    }
}

/// How a member resolves its entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum GestureDisposition {
    /// The member claims the pointer.
    Accepted,
    /// The member gives up on the pointer.
    Rejected,
}

/// A notification for one arena member.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArenaDecision<M> {
    /// Pointer whose arena was decided.
    pub pointer: PointerId,
    /// Member to notify.
    pub member: M,
    /// Whether the member won or lost.
    pub disposition: GestureDisposition,
}

/// A member's single-use right to resolve its arena membership.
///
/// Consumed by [`GestureArenaManager::resolve`]. Dropping an entry without
/// resolving it leaves the member in the arena.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an arena entry is the only way to resolve membership"]
pub struct GestureArenaEntry<M> {
    pointer: PointerId,
    member: M,
}

impl<M: Copy> GestureArenaEntry<M> {
    /// Pointer of the arena this entry belongs to.
    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    /// Member holding this entry.
    pub fn member(&self) -> M {
        self.member
    }
}

#[derive(Clone, Debug)]
struct GestureArena<M> {
    members: Vec<M>,
    state: ArenaState,
    eager_winner: Option<M>,
    has_pending_sweep: bool,
}

impl<M> GestureArena<M> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            state: ArenaState::OPEN,
            eager_winner: None,
            has_pending_sweep: false,
        }
    }

    fn is_open(&self) -> bool {
        self.state.contains(ArenaState::OPEN)
    }

    fn is_held(&self) -> bool {
        self.state.contains(ArenaState::HELD)
    }
}

/// Owns the arenas of all pointers and runs the arbitration protocol.
#[derive(Clone)]
pub struct GestureArenaManager<M> {
    arenas: HashMap<PointerId, GestureArena<M>>,
    decisions: VecDeque<ArenaDecision<M>>,
}

impl<M: fmt::Debug> fmt::Debug for GestureArenaManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureArenaManager")
            .field("arenas", &self.arenas.len())
            .field("decisions", &self.decisions)
            .finish()
    }
}

impl<M> Default for GestureArenaManager<M> {
    fn default() -> Self {
        Self {
            arenas: HashMap::new(),
            decisions: VecDeque::new(),
        }
    }
}

impl<M: Copy + Eq + fmt::Debug> GestureArenaManager<M> {
    /// Create a manager without arenas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `member` to the arena for `pointer`, creating the arena if needed.
    ///
    /// # Panics
    ///
    /// Panics if the arena is already closed.
    pub fn add(&mut self, pointer: PointerId, member: M) -> GestureArenaEntry<M> {
        let arena = self.arenas.entry(pointer).or_insert_with(|| {
            tracing::debug!(pointer = %pointer, "arena created");
            GestureArena::new()
        });
        assert!(
            arena.is_open(),
            "{member:?} cannot join the closed arena for pointer {pointer}"
        );
        arena.members.push(member);
        tracing::trace!(pointer = %pointer, member = ?member, "arena member added");
        GestureArenaEntry { pointer, member }
    }

    /// Prevent new members from joining and try to decide the arena.
    pub fn close(&mut self, pointer: PointerId, scheduler: &mut dyn Scheduler<GestureTask>) {
        let Some(arena) = self.arenas.get_mut(&pointer) else {
            return;
        };
        arena.state.remove(ArenaState::OPEN);
        tracing::debug!(pointer = %pointer, members = arena.members.len(), "arena closed");
        self.try_to_resolve_arena(pointer, scheduler);
    }

    /// Force a decision: the first member to have joined wins.
    ///
    /// If the arena is held the sweep is deferred until [`release`](Self::release).
    ///
    /// # Panics
    ///
    /// Panics if the arena is still open.
    pub fn sweep(&mut self, pointer: PointerId) {
        let Some(arena) = self.arenas.get_mut(&pointer) else {
            return;
        };
        assert!(!arena.is_open(), "cannot sweep the open arena for pointer {pointer}");
        if arena.is_held() {
            arena.has_pending_sweep = true;
            tracing::debug!(pointer = %pointer, "arena sweep deferred");
            return;
        }
        let Some(arena) = self.arenas.remove(&pointer) else {
            return;
        };
        tracing::debug!(pointer = %pointer, "arena swept");
        if let Some((&winner, rest)) = arena.members.split_first() {
            for &member in rest {
                self.notify(pointer, member, GestureDisposition::Rejected);
            }
            self.notify(pointer, winner, GestureDisposition::Accepted);
        }
    }

    /// Defer sweeping until [`release`](Self::release).
    pub fn hold(&mut self, pointer: PointerId) {
        if let Some(arena) = self.arenas.get_mut(&pointer) {
            arena.state.insert(ArenaState::HELD);
            tracing::debug!(pointer = %pointer, "arena held");
        }
    }

    /// Allow sweeping again, running a sweep that was deferred by [`hold`](Self::hold).
    pub fn release(&mut self, pointer: PointerId) {
        let Some(arena) = self.arenas.get_mut(&pointer) else {
            return;
        };
        arena.state.remove(ArenaState::HELD);
        tracing::debug!(pointer = %pointer, "arena released");
        if arena.has_pending_sweep {
            self.sweep(pointer);
        }
    }

    /// Resolve `entry` with `disposition`.
    ///
    /// Rejecting removes the member and notifies it. Accepting while the arena
    /// is open records an eager winner (the first one counts); accepting a
    /// closed arena decides it immediately.
    ///
    /// # Panics
    ///
    /// Panics if the arena no longer exists or the member is no longer part of
    /// it, unless a notification for the member is still queued.
    pub fn resolve(
        &mut self,
        entry: GestureArenaEntry<M>,
        disposition: GestureDisposition,
        scheduler: &mut dyn Scheduler<GestureTask>,
    ) {
        let GestureArenaEntry { pointer, member } = entry;
        if self.has_pending_decision(pointer, member) {
            tracing::trace!(
                pointer = %pointer,
                member = ?member,
                "arena already decided for member"
            );
            return;
        }
        let Some(arena) = self.arenas.get_mut(&pointer) else {
            panic!("{member:?} resolved the absent arena for pointer {pointer}");
        };
        let Some(index) = arena.members.iter().position(|m| *m == member) else {
            panic!("{member:?} is not a member of the arena for pointer {pointer}");
        };
        match disposition {
            GestureDisposition::Rejected => {
                arena.members.remove(index);
                let closed = !arena.is_open();
                self.notify(pointer, member, GestureDisposition::Rejected);
                if closed {
                    self.try_to_resolve_arena(pointer, scheduler);
                }
            }
            GestureDisposition::Accepted => {
                if arena.is_open() {
                    if arena.eager_winner.is_none() {
                        tracing::debug!(pointer = %pointer, member = ?member, "eager winner");
                        arena.eager_winner = Some(member);
                    }
                } else {
                    self.resolve_in_favor_of(pointer, member);
                }
            }
        }
    }

    /// Accept the sole remaining member of a closed arena.
    ///
    /// Runs from the [`GestureTask::ResolveArena`] microtask scheduled by
    /// [`close`](Self::close). Does nothing if the arena was decided meanwhile.
    pub fn resolve_by_default(&mut self, pointer: PointerId) {
        let Some(arena) = self.arenas.get(&pointer) else {
            return;
        };
        assert_eq!(
            arena.members.len(),
            1,
            "default resolution needs exactly one member"
        );
        let Some(arena) = self.arenas.remove(&pointer) else {
            return;
        };
        let winner = arena.members[0];
        tracing::debug!(pointer = %pointer, member = ?winner, "default winner");
        self.notify(pointer, winner, GestureDisposition::Accepted);
    }

    /// Take the oldest queued notification.
    pub fn take_decision(&mut self) -> Option<ArenaDecision<M>> {
        self.decisions.pop_front()
    }

    /// Whether an arena exists for `pointer`.
    pub fn has_arena(&self, pointer: PointerId) -> bool {
        self.arenas.contains_key(&pointer)
    }

    /// Whether no arena is open or awaiting a decision.
    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    /// Members of the arena for `pointer`, in join order.
    pub fn members(&self, pointer: PointerId) -> Option<&[M]> {
        self.arenas.get(&pointer).map(|a| a.members.as_slice())
    }

    /// State bits of the arena for `pointer`.
    pub fn state(&self, pointer: PointerId) -> Option<ArenaState> {
        self.arenas.get(&pointer).map(|a| a.state)
    }

    fn has_pending_decision(&self, pointer: PointerId, member: M) -> bool {
        self.decisions
            .iter()
            .any(|d| d.pointer == pointer && d.member == member)
    }

    fn notify(&mut self, pointer: PointerId, member: M, disposition: GestureDisposition) {
        tracing::trace!(pointer = %pointer, member = ?member, ?disposition, "arena decision");
        self.decisions.push_back(ArenaDecision {
            pointer,
            member,
            disposition,
        });
    }

    fn try_to_resolve_arena(
        &mut self,
        pointer: PointerId,
        scheduler: &mut dyn Scheduler<GestureTask>,
    ) {
        let Some(arena) = self.arenas.get(&pointer) else {
            return;
        };
        debug_assert!(!arena.is_open(), "only closed arenas resolve");
        match (arena.members.len(), arena.eager_winner) {
            (1, _) => {
                scheduler.schedule_microtask(GestureTask::ResolveArena(pointer));
            }
            (0, _) => {
                self.arenas.remove(&pointer);
                tracing::debug!(pointer = %pointer, "arena discarded without members");
            }
            (_, Some(winner)) => self.resolve_in_favor_of(pointer, winner),
            _ => {}
        }
    }

    fn resolve_in_favor_of(&mut self, pointer: PointerId, winner: M) {
        let Some(arena) = self.arenas.remove(&pointer) else {
            return;
        };
        debug_assert!(
            arena.eager_winner.is_none_or(|w| w == winner),
            "resolved in favor of a member other than the eager winner"
        );
        tracing::debug!(pointer = %pointer, member = ?winner, "arena won");
        for &member in arena.members.iter().filter(|m| **m != winner) {
            self.notify(pointer, member, GestureDisposition::Rejected);
        }
        self.notify(pointer, winner, GestureDisposition::Accepted);
    }
}
