//! Engine state - current word, trail bookkeeping, and the pending timers
//!
//! This is rebuilt from scratch whenever a new timing table is installed.

use std::collections::BTreeMap;

use crate::commands::HighlightKind;

/// Highlight lifecycle of the active block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No timing table loaded
    #[default]
    Idle,
    /// Table ready, transport not playing
    Loaded,
    /// Actively advancing through words
    Playing,
    /// Paused mid-block; highlight retained per config
    Paused,
    /// The last word's window elapsed (or the range stop was reached)
    Ended,
}

/// The kinds of scheduled task the engine arms; one outstanding task per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Fires when the next highlight transition is due
    Transition,
    /// Fires after the post-seek grace period to detect a wedged transport
    StallCheck,
}

/// Identifies one armed task; a fired task whose generation is not the
/// pending one is stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub kind: TimerKind,
    pub generation: u64,
}

/// A pending stall check and the position recorded when it was armed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StallWatch {
    pub handle: TimerHandle,
    pub position_ms: f64,
}

/// Which highlight marks a word currently carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marks {
    pub current: bool,
    pub trail: bool,
}

impl Marks {
    fn set(&mut self, kind: HighlightKind, on: bool) {
        match kind {
            HighlightKind::Current => self.current = on,
            HighlightKind::Trail => self.trail = on,
        }
    }

    fn is_clear(&self) -> bool {
        !self.current && !self.trail
    }
}

/// Mutable per-block engine state
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub phase: Phase,
    /// Index of the highlighted word
    pub current_word: Option<usize>,
    /// Locator cache: index of the last resolved word
    pub last_resolved: Option<usize>,
    pub pending_transition: Option<TimerHandle>,
    pub stall_watch: Option<StallWatch>,
    /// Layout offset of the last highlighted word, for line-break detection
    pub prev_line_offset: i32,
    /// Words currently carrying a mark
    marks: BTreeMap<usize, Marks>,
}

impl EngineState {
    /// Fresh state for a newly installed table
    pub fn loaded(prev_line_offset: i32) -> Self {
        Self {
            phase: Phase::Loaded,
            prev_line_offset,
            ..Self::default()
        }
    }

    pub fn record_mark(&mut self, index: usize, kind: HighlightKind, on: bool) {
        if on {
            self.marks.entry(index).or_default().set(kind, true);
        } else if let Some(marks) = self.marks.get_mut(&index) {
            marks.set(kind, false);
            if marks.is_clear() {
                self.marks.remove(&index);
            }
        }
    }

    pub fn marks_of(&self, index: usize) -> Marks {
        self.marks.get(&index).copied().unwrap_or_default()
    }

    /// Every (word, kind) pair that is currently applied, in word order
    pub fn applied_marks(&self) -> Vec<(usize, HighlightKind)> {
        let mut applied = Vec::new();
        for (&index, marks) in &self.marks {
            if marks.current {
                applied.push((index, HighlightKind::Current));
            }
            if marks.trail {
                applied.push((index, HighlightKind::Trail));
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_tracked_per_kind() {
        let mut state = EngineState::loaded(0);
        state.record_mark(3, HighlightKind::Current, true);
        state.record_mark(2, HighlightKind::Trail, true);
        state.record_mark(3, HighlightKind::Trail, true);

        assert_eq!(
            state.applied_marks(),
            vec![
                (2, HighlightKind::Trail),
                (3, HighlightKind::Current),
                (3, HighlightKind::Trail)
            ]
        );

        state.record_mark(3, HighlightKind::Current, false);
        state.record_mark(3, HighlightKind::Trail, false);
        assert_eq!(state.marks_of(3), Marks::default());
        assert_eq!(state.applied_marks().len(), 1);
    }

    #[test]
    fn test_retracting_unmarked_word_is_noop() {
        let mut state = EngineState::default();
        state.record_mark(9, HighlightKind::Trail, false);
        assert!(state.applied_marks().is_empty());
    }
}
