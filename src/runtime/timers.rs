//! Timer queue on a virtual clock
//!
//! One slot per [`TimerKind`]: arming a kind replaces whatever was pending
//! for it, so there is never more than one outstanding transition.

use std::collections::BTreeMap;

use crate::messages::TimerMsg;
use crate::model::{TimerHandle, TimerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    due_at: u64,
    generation: u64,
}

/// Counters kept for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    pub armed: u64,
    pub cancelled: u64,
    pub fired: u64,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    slots: BTreeMap<TimerKind, Slot>,
    stats: TimerStats,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `handle` to fire at `now_ms + delay_ms`, replacing its kind's slot
    pub fn arm(&mut self, handle: TimerHandle, now_ms: u64, delay_ms: u64) {
        let slot = Slot {
            due_at: now_ms.saturating_add(delay_ms),
            generation: handle.generation,
        };
        if let Some(prev) = self.slots.insert(handle.kind, slot) {
            tracing::trace!(
                target: "timer",
                kind = ?handle.kind,
                generation = prev.generation,
                "replaced without cancel"
            );
            self.stats.cancelled += 1;
        }
        self.stats.armed += 1;
    }

    /// Cancel the pending timer of `kind`; returns whether one was pending
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let removed = self.slots.remove(&kind).is_some();
        if removed {
            self.stats.cancelled += 1;
        }
        removed
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Generation of the pending timer of `kind`
    pub fn pending_generation(&self, kind: TimerKind) -> Option<u64> {
        self.slots.get(&kind).map(|s| s.generation)
    }

    pub fn pending(&self) -> usize {
        self.slots.len()
    }

    /// Earliest due time across all slots
    pub fn next_due(&self) -> Option<u64> {
        self.slots.values().map(|s| s.due_at).min()
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerMsg> {
        let (&kind, slot) = self
            .slots
            .iter()
            .filter(|(_, s)| s.due_at <= now_ms)
            .min_by_key(|(_, s)| s.due_at)?;
        let generation = slot.generation;
        self.slots.remove(&kind);
        self.stats.fired += 1;

        Some(match kind {
            TimerKind::Transition => TimerMsg::TransitionFired { generation },
            TimerKind::StallCheck => TimerMsg::StallCheckFired { generation },
        })
    }

    pub fn stats(&self) -> TimerStats {
        self.stats
    }
}
