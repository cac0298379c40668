//! Synchronization model - the complete state of one read-along engine
//!
//! Configuration is immutable once the model is built; everything that
//! changes at runtime lives in the sequencer state, the engine state, and the
//! active timing table.

pub mod engine;
pub mod locator;
pub mod sequencer;
pub mod timing;

pub use engine::{EngineState, Marks, Phase, StallWatch, TimerHandle, TimerKind};
pub use locator::{locate, locate_uncached, position_to_ms};
pub use sequencer::{resolve_block, SequencerState};
pub use timing::{RangeFilter, RawWord, TimingTable, Word, WordRef, WordSpan};

use crate::config::SyncConfig;
use crate::content::BlockContent;

/// Snapshot of the playback transport, taken when a message is handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub position_ms: f64,
    pub is_playing: bool,
    pub playback_rate: f64,
    /// Hard stop for range playback, if any
    pub stop_at_ms: Option<f64>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            position_ms: 0.0,
            is_playing: false,
            playback_rate: 1.0,
            stop_at_ms: None,
        }
    }
}

/// The complete engine model
#[derive(Debug, Clone)]
pub struct SyncModel {
    pub config: SyncConfig,
    pub sequencer: SequencerState,
    pub engine: EngineState,
    /// Active timing table; `None` until a block is loaded
    pub table: Option<TimingTable>,
    /// Generation counter for armed tasks, never reset
    next_generation: u64,
}

impl SyncModel {
    pub fn new(config: SyncConfig) -> Self {
        let sequencer = SequencerState::new(config.playback_rate);
        Self {
            config,
            sequencer,
            engine: EngineState::default(),
            table: None,
            next_generation: 0,
        }
    }

    /// Replace the active table, discarding all per-block engine state
    pub fn install(&mut self, block: &BlockContent, table: TimingTable, prev_line_offset: i32) {
        self.sequencer.block_id = Some(block.id.clone());
        self.sequencer.audio_ref = Some(block.audio_ref.clone());
        self.sequencer.stop_at_ms = table.range().map(|r| r.stop_ms as f64);
        self.table = Some(table);
        self.engine = EngineState::loaded(prev_line_offset);
    }

    /// Stamp a new handle for a task of `kind`
    pub fn next_handle(&mut self, kind: TimerKind) -> TimerHandle {
        self.next_generation += 1;
        TimerHandle {
            kind,
            generation: self.next_generation,
        }
    }

    pub fn current_word(&self) -> Option<&Word> {
        let index = self.engine.current_word?;
        self.table.as_ref()?.get(index)
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_increase() {
        let mut model = SyncModel::new(SyncConfig::default());
        let a = model.next_handle(TimerKind::Transition);
        let b = model.next_handle(TimerKind::StallCheck);
        assert!(b.generation > a.generation);
    }

    #[test]
    fn test_install_resets_engine_and_sets_range_stop() {
        let mut model = SyncModel::new(SyncConfig::default());
        model.engine.current_word = Some(3);
        model.engine.phase = Phase::Playing;

        let block = BlockContent {
            id: "p1".to_string(),
            audio_ref: "p1.mp3".to_string(),
            word_spans: vec![WordSpan::new(0, 500), WordSpan::new(500, 700)],
            element_refs: vec![],
        };
        let table =
            TimingTable::build(block.raw_words(), Some(RangeFilter::new(500, 1200))).unwrap();
        model.install(&block, table, 0);

        assert_eq!(model.phase(), Phase::Loaded);
        assert_eq!(model.engine.current_word, None);
        assert_eq!(model.sequencer.stop_at_ms, Some(1200.0));
        assert_eq!(model.sequencer.block_id.as_deref(), Some("p1"));
    }
}
