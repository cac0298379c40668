//! Block sequencer state - which block is loaded, range stop, rate, and
//! the measured play-start latency

use crate::config::clamp_rate;
use crate::content::{BlockContent, ContentSource};
use crate::error::SyncError;

use super::timing::{RangeFilter, TimingTable};

/// Per-engine sequencing state, surviving block switches
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerState {
    pub block_id: Option<String>,
    pub audio_ref: Option<String>,
    /// Hard stop for range playback (milliseconds)
    pub stop_at_ms: Option<f64>,
    /// Always within `[0.5, 2.0]`
    pub playback_rate: f64,
    /// Clock reading when play was last requested, until the transport reports playing
    pub play_requested_at: Option<u64>,
    /// Last observed delay between requesting play and the transport playing
    pub play_start_latency_ms: u64,
}

impl SequencerState {
    pub fn new(playback_rate: f64) -> Self {
        Self {
            block_id: None,
            audio_ref: None,
            stop_at_ms: None,
            playback_rate: clamp_rate(playback_rate),
            play_requested_at: None,
            play_start_latency_ms: 0,
        }
    }

    /// Clamp and store a rate; returns whether it changed
    pub fn set_rate(&mut self, rate: f64) -> bool {
        let rate = clamp_rate(rate);
        if rate == self.playback_rate {
            return false;
        }
        self.playback_rate = rate;
        true
    }

    pub fn request_play(&mut self, now_ms: u64) {
        self.play_requested_at = Some(now_ms);
    }

    /// The transport reported playing; update the latency estimate
    pub fn record_playing(&mut self, now_ms: u64) -> Option<u64> {
        let requested = self.play_requested_at.take()?;
        let latency = now_ms.saturating_sub(requested);
        self.play_start_latency_ms = latency;
        Some(latency)
    }

    pub fn is_range_playback(&self) -> bool {
        self.stop_at_ms.is_some()
    }

    /// Whether `position_ms` has reached the range stop
    pub fn past_stop(&self, position_ms: f64) -> bool {
        self.stop_at_ms.is_some_and(|stop| position_ms >= stop)
    }
}

/// Resolve a block and build its timing table without touching any state
pub fn resolve_block(
    content: &dyn ContentSource,
    block_id: &str,
    range: Option<RangeFilter>,
) -> Result<(BlockContent, TimingTable), SyncError> {
    let block = content
        .block(block_id)
        .ok_or_else(|| SyncError::BlockNotFound(block_id.to_string()))?;
    let table = TimingTable::build(block.raw_words(), range)?;
    Ok((block, table))
}
