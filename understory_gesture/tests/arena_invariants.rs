// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for arena arbitration.
//!
//! Whatever order members accept, reject, and microtasks run in, once the
//! arena is gone every member has been notified exactly once and at most one
//! of them won.

use std::collections::HashMap;

use proptest::prelude::*;
use understory_gesture::{
    ArenaState, GestureArenaEntry, GestureArenaManager, GestureDisposition, GestureTask, Scheduler,
    TaskQueue,
};
use understory_pointer::PointerId;

const P: PointerId = PointerId(1);

#[derive(Copy, Clone, Debug)]
enum Op {
    Accept(u8),
    Reject(u8),
    Microtasks,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0_u8..6).prop_map(Op::Accept),
        3 => (0_u8..6).prop_map(Op::Reject),
        1 => Just(Op::Microtasks),
    ]
}

struct Run {
    members: u8,
    arena: GestureArenaManager<u8>,
    queue: TaskQueue<GestureTask>,
    entries: Vec<Option<GestureArenaEntry<u8>>>,
    notified: HashMap<u8, GestureDisposition>,
    self_rejected: Vec<u8>,
    closed_accept: Option<u8>,
}

impl Run {
    fn new(members: u8) -> Self {
        let mut arena = GestureArenaManager::new();
        let entries = (0..members).map(|m| Some(arena.add(P, m))).collect();
        Self {
            members,
            arena,
            queue: TaskQueue::new(),
            entries,
            notified: HashMap::new(),
            self_rejected: Vec::new(),
            closed_accept: None,
        }
    }

    fn drain(&mut self) -> Result<(), TestCaseError> {
        while let Some(decision) = self.arena.take_decision() {
            prop_assert_eq!(decision.pointer, P);
            let previous = self.notified.insert(decision.member, decision.disposition);
            prop_assert!(
                previous.is_none(),
                "member {} notified twice",
                decision.member
            );
        }
        Ok(())
    }

    fn run_microtasks(&mut self) {
        while let Some(task) = self.queue.pop_ready() {
            if let GestureTask::ResolveArena(pointer) = task {
                self.arena.resolve_by_default(pointer);
            }
        }
    }

    fn apply(&mut self, op: Op) -> Result<(), TestCaseError> {
        let (member, disposition) = match op {
            Op::Microtasks => {
                self.run_microtasks();
                return self.drain();
            }
            Op::Accept(m) => (m, GestureDisposition::Accepted),
            Op::Reject(m) => (m, GestureDisposition::Rejected),
        };
        let member = member % self.members;
        let index = usize::from(member);
        // A member may only resolve while it is still part of the arena.
        let present = self
            .arena
            .members(P)
            .is_some_and(|members| members.contains(&member));
        if !present {
            return Ok(());
        }
        let Some(entry) = self.entries[index].take() else {
            return Ok(());
        };
        let open = self
            .arena
            .state(P)
            .is_some_and(|s| s.contains(ArenaState::OPEN));
        match disposition {
            GestureDisposition::Rejected => self.self_rejected.push(member),
            GestureDisposition::Accepted if !open && self.closed_accept.is_none() => {
                self.closed_accept = Some(member);
            }
            GestureDisposition::Accepted => {}
        }
        self.arena.resolve(entry, disposition, &mut self.queue);
        self.drain()
    }
}

proptest! {
    #[test]
    fn one_winner_everyone_notified_once(
        members in 1_u8..6,
        before_close in prop::collection::vec(op_strategy(), 0..6),
        after_close in prop::collection::vec(op_strategy(), 0..10),
    ) {
        let mut run = Run::new(members);
        for op in before_close {
            run.apply(op)?;
        }
        run.arena.close(P, &mut run.queue);
        run.drain()?;
        for op in after_close {
            run.apply(op)?;
        }
        if run.arena.has_arena(P) {
            run.arena.sweep(P);
            run.drain()?;
        }
        run.run_microtasks();
        run.drain()?;

        prop_assert!(!run.arena.has_arena(P));
        prop_assert_eq!(run.notified.len(), usize::from(members));
        let winners: Vec<u8> = run
            .notified
            .iter()
            .filter(|(_, d)| **d == GestureDisposition::Accepted)
            .map(|(m, _)| *m)
            .collect();
        if run.self_rejected.len() == usize::from(members) {
            prop_assert!(winners.is_empty());
        } else {
            prop_assert_eq!(winners.len(), 1);
            prop_assert!(!run.self_rejected.contains(&winners[0]));
        }
        for member in &run.self_rejected {
            prop_assert_eq!(run.notified.get(member), Some(&GestureDisposition::Rejected));
        }
        if let Some(member) = run.closed_accept {
            prop_assert_eq!(winners, vec![member]);
        }
    }
}

#[test]
fn sweep_waits_for_release() {
    let mut arena = GestureArenaManager::new();
    let mut queue = TaskQueue::new();
    let _a = arena.add(P, 'a');
    let _b = arena.add(P, 'b');
    arena.close(P, &mut queue);
    arena.hold(P);
    arena.sweep(P);
    assert!(arena.take_decision().is_none());
    assert!(arena.has_arena(P));

    arena.release(P);
    let decisions: Vec<_> = std::iter::from_fn(|| arena.take_decision())
        .map(|d| (d.member, d.disposition))
        .collect();
    assert_eq!(
        decisions,
        [
            ('b', GestureDisposition::Rejected),
            ('a', GestureDisposition::Accepted),
        ]
    );
    assert!(queue.is_empty());
}
