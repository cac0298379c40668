//! Command types for the Elm-style architecture
//!
//! Commands represent side effects that should be performed after an update.
//! The runtime executes them in order against the transport, the highlight
//! and scroll sinks, the timer queue, and the listeners.

use crate::config::HighlightClasses;
use crate::events::SyncEvent;
use crate::model::engine::{TimerHandle, TimerKind};
use crate::model::timing::WordRef;

/// Highlight marks a word can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HighlightKind {
    /// The word being spoken
    Current,
    /// Recently spoken words
    Trail,
}

impl HighlightKind {
    pub fn class_name(self, classes: &HighlightClasses) -> &str {
        match self {
            HighlightKind::Current => &classes.current,
            HighlightKind::Trail => &classes.trail,
        }
    }
}

/// Whether a mark is added or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOp {
    Apply,
    Retract,
}

/// A single highlight instruction for the highlight sink
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightIntent {
    pub op: IntentOp,
    pub kind: HighlightKind,
    /// Index of the word in the active timing table
    pub index: usize,
    pub element: WordRef,
}

/// Requests to the playback transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCmd {
    SetSource(String),
    Play,
    Pause,
    /// Move the playhead (milliseconds)
    Seek(f64),
    SetRate(f64),
}

/// Side effects requested by an update
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cmd {
    /// No command - do nothing
    #[default]
    None,
    Transport(TransportCmd),
    Highlight(HighlightIntent),
    /// Scroll the reading view by a line delta
    Scroll { delta_px: i32, duration_ms: u64 },
    /// Schedule a task, replacing any outstanding task of the same kind
    ArmTimer { handle: TimerHandle, delay_ms: u64 },
    /// Cancel the outstanding task of this kind, if any
    CancelTimer(TimerKind),
    /// Deliver an event to listeners
    Emit(SyncEvent),
    /// Execute multiple commands in order
    Batch(Vec<Cmd>),
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        Cmd::Batch(cmds)
    }

    /// Collapse a command list: nothing, a single command, or a batch
    pub fn from_vec(mut cmds: Vec<Cmd>) -> Option<Cmd> {
        cmds.retain(|c| !matches!(c, Cmd::None));
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(Cmd::Batch(cmds)),
        }
    }

    /// Flatten nested batches into execution order
    pub fn into_flat(self) -> Vec<Cmd> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<Cmd>) {
        match self {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    cmd.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_collapses() {
        assert_eq!(Cmd::from_vec(vec![]), None);
        assert_eq!(Cmd::from_vec(vec![Cmd::None]), None);
        assert_eq!(
            Cmd::from_vec(vec![Cmd::Transport(TransportCmd::Play)]),
            Some(Cmd::Transport(TransportCmd::Play))
        );
    }

    #[test]
    fn test_into_flat_preserves_order() {
        let cmd = Cmd::batch(vec![
            Cmd::Transport(TransportCmd::Pause),
            Cmd::batch(vec![
                Cmd::CancelTimer(TimerKind::Transition),
                Cmd::None,
                Cmd::Transport(TransportCmd::Play),
            ]),
        ]);
        assert_eq!(
            cmd.into_flat(),
            vec![
                Cmd::Transport(TransportCmd::Pause),
                Cmd::CancelTimer(TimerKind::Transition),
                Cmd::Transport(TransportCmd::Play),
            ]
        );
    }

    #[test]
    fn test_class_names() {
        let classes = HighlightClasses::default();
        assert_eq!(HighlightKind::Current.class_name(&classes), "audio-highlight");
        assert_eq!(HighlightKind::Trail.class_name(&classes), "audio-trail");
    }
}
