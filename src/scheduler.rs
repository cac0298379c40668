//! Transition scheduler - arms the single wake-up for the next highlight change
//!
//! Position updates from transports arrive roughly every 250ms, far too
//! coarse for word-level highlighting, so the engine computes exactly when
//! the next word begins and asks for a timer at that moment.

use crate::commands::Cmd;
use crate::model::{PlaybackState, SyncModel, TimerKind, TimingTable, Word};

/// Inputs that shift the end-of-block wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndCorrection {
    /// Time the transport needs to honor a stop request
    pub stop_latency_ms: u64,
    /// Last observed delay between requesting play and playback starting
    pub start_latency_ms: u64,
}

/// Position (ms) at which the transition after `current` is due, and whether
/// that transition ends the block
pub fn transition_target(
    current: &Word,
    table: &TimingTable,
    stop_at_ms: Option<f64>,
) -> (f64, bool) {
    let (target, is_final) = match table.get(current.index + 1) {
        Some(next) => (next.begin as f64, false),
        None => (current.end as f64, true),
    };

    match stop_at_ms {
        Some(stop) if stop <= target => (stop, true),
        _ => (target, is_final),
    }
}

/// Milliseconds of wall time until the transition after `current` is due
///
/// `max(round((target - position) / rate), 0)`; the final transition of a
/// block is pulled earlier by the stop latency and pushed later by the last
/// play-start latency.
pub fn transition_delay(
    current: &Word,
    table: &TimingTable,
    playback: &PlaybackState,
    correction: EndCorrection,
) -> u64 {
    let (target, is_final) = transition_target(current, table, playback.stop_at_ms);
    let rate = if playback.playback_rate > 0.0 {
        playback.playback_rate
    } else {
        1.0
    };

    let mut delay = (target - playback.position_ms) / rate;
    if is_final {
        delay = delay - correction.stop_latency_ms as f64 + correction.start_latency_ms as f64;
    }

    let delay = delay.round();
    if delay > 0.0 {
        delay as u64
    } else {
        0
    }
}

/// Cancel the pending transition, if any
pub fn cancel_transition(model: &mut SyncModel) -> Option<Cmd> {
    model.engine.pending_transition.take().map(|handle| {
        tracing::trace!(target: "timer", generation = handle.generation, "transition cancelled");
        Cmd::CancelTimer(TimerKind::Transition)
    })
}

/// Cancel any pending transition and arm a fresh one from the current word
///
/// Returns no commands when no word is current.
pub fn arm_next(model: &mut SyncModel, playback: &PlaybackState) -> Vec<Cmd> {
    let mut cmds = Vec::with_capacity(2);
    cmds.extend(cancel_transition(model));

    let correction = EndCorrection {
        stop_latency_ms: model.config.stop_latency_ms,
        start_latency_ms: model.sequencer.play_start_latency_ms,
    };
    let delay_ms = match (model.table.as_ref(), model.engine.current_word) {
        (Some(table), Some(index)) => match table.get(index) {
            Some(word) => transition_delay(word, table, playback, correction),
            None => return cmds,
        },
        _ => return cmds,
    };

    let handle = model.next_handle(TimerKind::Transition);
    model.engine.pending_transition = Some(handle);
    tracing::debug!(
        target: "timer",
        generation = handle.generation,
        delay_ms,
        word = ?model.engine.current_word,
        "transition armed"
    );
    cmds.push(Cmd::ArmTimer { handle, delay_ms });
    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawWord, WordRef, WordSpan};

    fn table() -> TimingTable {
        let raw = [(0, 500), (500, 700), (1200, 300)]
            .into_iter()
            .map(|(begin, dur)| RawWord {
                span: WordSpan::new(begin, dur),
                element: WordRef::default(),
            });
        TimingTable::build(raw, None).unwrap()
    }

    fn playback(position_ms: f64, rate: f64) -> PlaybackState {
        PlaybackState {
            position_ms,
            is_playing: true,
            playback_rate: rate,
            stop_at_ms: None,
        }
    }

    #[test]
    fn test_delay_targets_next_word_begin() {
        let t = table();
        let delay = transition_delay(t.first(), &t, &playback(100.0, 1.0), EndCorrection::default());
        assert_eq!(delay, 400);
    }

    #[test]
    fn test_delay_scales_with_rate() {
        let t = table();
        let word = t.get(1).unwrap();
        let at = |rate| transition_delay(word, &t, &playback(800.0, rate), EndCorrection::default());
        assert_eq!(at(1.0), 400);
        assert_eq!(at(2.0), 200);
        assert_eq!(at(0.5), 800);
    }

    #[test]
    fn test_delay_strictly_decreases_as_rate_increases() {
        let t = table();
        let word = t.first();
        let mut last = u64::MAX;
        for step in 0..=15 {
            let rate = 0.5 + step as f64 * 0.1;
            let delay =
                transition_delay(word, &t, &playback(0.0, rate), EndCorrection::default());
            assert!(delay < last, "rate {} gave {} (prev {})", rate, delay, last);
            last = delay;
        }
    }

    #[test]
    fn test_delay_never_negative() {
        let t = table();
        let delay =
            transition_delay(t.first(), &t, &playback(9_000.0, 1.0), EndCorrection::default());
        assert_eq!(delay, 0);
    }

    #[test]
    fn test_last_word_applies_end_correction() {
        let t = table();
        let correction = EndCorrection {
            stop_latency_ms: 200,
            start_latency_ms: 30,
        };
        // 1500 - 1200 - 200 + 30
        assert_eq!(
            transition_delay(t.last(), &t, &playback(1200.0, 1.0), correction),
            130
        );
    }

    #[test]
    fn test_stop_boundary_caps_target() {
        let t = table();
        let (target, is_final) = transition_target(t.first(), &t, Some(300.0));
        assert_eq!(target, 300.0);
        assert!(is_final);

        let (target, is_final) = transition_target(t.first(), &t, Some(5_000.0));
        assert_eq!(target, 500.0);
        assert!(!is_final);
    }
}
