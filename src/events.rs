//! Listener events emitted while synchronizing
//!
//! Events are delivered synchronously, in the order they occur, to every
//! subscribed [`SyncListener`].

use crate::model::timing::Word;

/// A synchronization event with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Playback of a block started at its first word
    Start {
        block_id: String,
        words: Vec<Word>,
        duration_ms: u64,
        rate: f64,
    },
    /// Playback paused before the last word
    Pause { word: Word },
    /// Playback resumed (or restarted from a word)
    Resume { word: Word },
    /// The position moved through a seek while playing
    Move { word: Word },
    /// Highlighting wrapped onto a new layout line
    Newline {
        prev_offset: i32,
        new_offset: i32,
        percent_complete: u8,
    },
    /// The block (or played range) finished
    Complete { block_id: String },
}

impl SyncEvent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::Start { .. } => "start",
            SyncEvent::Pause { .. } => "pause",
            SyncEvent::Resume { .. } => "resume",
            SyncEvent::Move { .. } => "move",
            SyncEvent::Newline { .. } => "newline",
            SyncEvent::Complete { .. } => "complete",
        }
    }
}

/// Receives [`SyncEvent`]s
pub trait SyncListener {
    fn on_event(&mut self, event: &SyncEvent);
}

impl<F> SyncListener for F
where
    F: FnMut(&SyncEvent),
{
    fn on_event(&mut self, event: &SyncEvent) {
        self(event)
    }
}
