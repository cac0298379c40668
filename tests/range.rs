//! Range playback tests - playRange, playWord, and returning to whole blocks

mod common;

use common::{current_index, test_engine};
use readalong::config::SyncConfig;
use readalong::model::Phase;
use readalong::runtime::{PlayOptions, Transport};
use readalong::SyncError;

// ========================================================================
// playRange
// ========================================================================

#[test]
fn test_range_filters_table_and_sets_stop() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 500, 1200).unwrap();

    let words = engine.words();
    assert_eq!(words.len(), 1);
    assert_eq!((words[0].index, words[0].begin, words[0].dur), (0, 500, 700));
    assert_eq!(engine.model().sequencer.stop_at_ms, Some(1_200.0));
    assert_eq!(engine.transport().snapshot().position_ms, 500.0);
    assert_eq!(current_index(&engine), Some(0));
}

#[test]
fn test_range_auto_pauses_and_completes() {
    let (mut engine, rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 500, 1200).unwrap();

    engine.advance(1_000);
    let playback = engine.transport().snapshot();
    assert!(!playback.is_playing);
    assert!(playback.position_ms <= 1_200.0);
    assert_eq!(engine.phase(), Phase::Ended);
    assert_eq!(rec.count("complete"), 1);
    assert_eq!(engine.timers().pending(), 0);
}

#[test]
fn test_range_stops_exactly_without_stop_latency() {
    let config = SyncConfig {
        stop_latency_ms: 0,
        ..SyncConfig::default()
    };
    let (mut engine, rec) = test_engine(config);
    engine.play_range("p1", 500, 1200).unwrap();

    engine.advance(699);
    assert_eq!(rec.count("complete"), 0);
    engine.advance(1);
    assert_eq!(rec.count("complete"), 1);
    assert_eq!(engine.transport().snapshot().position_ms, 1_200.0);
}

#[test]
fn test_seeking_past_range_stop_completes() {
    let (mut engine, rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 500, 1200).unwrap();
    engine.advance(100);

    engine.set_current_time(1_250.0).unwrap();
    assert_eq!(engine.phase(), Phase::Ended);
    assert_eq!(rec.count("complete"), 1);
    assert!(!engine.transport().snapshot().is_playing);
}

#[test]
fn test_range_end_bound_is_exclusive_for_begins() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 0, 500).unwrap();
    assert_eq!(engine.words().len(), 1);
    assert_eq!(engine.words()[0].begin, 0);
}

#[test]
fn test_empty_range_is_rejected() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    engine.play_block("p1", PlayOptions::default()).unwrap();

    let result = engine.play_range("p1", 5_000, 6_000);
    assert_eq!(result, Err(SyncError::EmptyTimingTable));
    assert_eq!(engine.words().len(), 3);
    assert_eq!(engine.phase(), Phase::Playing);
}

#[test]
fn test_range_never_auto_continues() {
    let config = SyncConfig {
        auto_continue: true,
        ..SyncConfig::default()
    };
    let (mut engine, rec) = test_engine(config);
    engine.play_range("p1", 500, 1200).unwrap();
    engine.run_until_idle(10_000);

    assert_eq!(engine.block_id(), Some("p1"));
    assert_eq!(rec.count("start"), 1);
}

// ========================================================================
// playWord
// ========================================================================

#[test]
fn test_play_word_plays_just_that_word() {
    let (mut engine, rec) = test_engine(SyncConfig::default());
    engine.load_block("p1", None).unwrap();

    engine.play_word(1).unwrap();
    assert_eq!(engine.words().len(), 1);
    assert_eq!(engine.words()[0].element.id, "p1-w1");
    assert_eq!(engine.model().sequencer.stop_at_ms, Some(1_200.0));

    engine.run_until_idle(5_000);
    assert_eq!(rec.count("complete"), 1);
}

#[test]
fn test_play_word_during_range_uses_block_indices() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 500, 1200).unwrap();
    engine.run_until_idle(5_000);

    engine.play_word(2).unwrap();
    assert_eq!(engine.words().len(), 1);
    assert_eq!(engine.words()[0].element.id, "p1-w2");
    assert_eq!(engine.model().sequencer.stop_at_ms, Some(1_500.0));
}

#[test]
fn test_play_word_rejects_unknown_index() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    engine.load_block("p1", None).unwrap();
    assert_eq!(engine.play_word(3), Err(SyncError::UnknownWord(3)));
}

// ========================================================================
// Round Trip
// ========================================================================

#[test]
fn test_whole_block_after_range_restores_full_table() {
    let (mut engine, rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 500, 1200).unwrap();
    engine.run_until_idle(5_000);

    engine.play_block("p1", PlayOptions::default()).unwrap();
    assert_eq!(engine.model().sequencer.stop_at_ms, None);

    let (mut fresh, _) = test_engine(SyncConfig::default());
    fresh.load_block("p1", None).unwrap();
    assert_eq!(engine.words(), fresh.words());
    for (restored, unfiltered) in engine.words().iter().zip(fresh.words()) {
        assert_eq!(
            (restored.begin, restored.end, restored.dur),
            (unfiltered.begin, unfiltered.end, unfiltered.dur)
        );
        assert_eq!(restored.element, unfiltered.element);
    }

    engine.advance(1_250);
    assert_eq!(current_index(&engine), Some(2));
    engine.advance(100);
    assert_eq!(rec.count("complete"), 2);
}

#[test]
fn test_play_from_word_leaves_range() {
    let (mut engine, rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 500, 1200).unwrap();
    engine.advance(100);

    engine.play_from_word(0).unwrap();
    assert_eq!(engine.words().len(), 3);
    assert_eq!(engine.model().sequencer.stop_at_ms, None);
    assert_eq!(current_index(&engine), Some(0));
    assert_eq!(engine.transport().snapshot().position_ms, 10.0);

    // the whole block now plays through past the old range stop
    engine.run_until_idle(5_000);
    assert_eq!(rec.count("complete"), 1);
    assert_eq!(current_index(&engine), Some(2));
}

#[test]
fn test_play_from_unknown_word_keeps_range() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    engine.play_range("p1", 500, 1200).unwrap();

    assert_eq!(engine.play_from_word(3), Err(SyncError::UnknownWord(3)));
    assert_eq!(engine.words().len(), 1);
    assert_eq!(engine.model().sequencer.stop_at_ms, Some(1_200.0));
}
