//! Word lookup tests - getCurrentWord through the engine and the locator directly

mod common;

use common::{current_index, test_engine};
use readalong::config::SyncConfig;
use readalong::model::{locate, locate_uncached, RawWord, TimingTable, WordRef, WordSpan};

/// Deterministic generator for randomized tables
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn table(spans: &[(u64, u64)]) -> TimingTable {
    let raw = spans.iter().enumerate().map(|(i, &(begin, dur))| RawWord {
        span: WordSpan::new(begin, dur),
        element: WordRef {
            id: format!("w{}", i),
            ..WordRef::default()
        },
    });
    TimingTable::build(raw, None).unwrap()
}

// ========================================================================
// Through the Engine
// ========================================================================

#[test]
fn test_current_word_follows_position() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    assert!(engine.current_word().is_none());

    engine.load_block("p1", None).unwrap();
    assert_eq!(current_index(&engine), Some(0));

    for (position, expected) in [(600.0, 1), (1_500.0, 2), (500.0, 1), (499.0, 0), (1_199.0, 1)] {
        engine.set_current_time(position).unwrap();
        assert_eq!(
            current_index(&engine),
            Some(expected),
            "position {}",
            position
        );
    }
}

#[test]
fn test_load_block_at_position() {
    let (mut engine, _rec) = test_engine(SyncConfig::default());
    engine.load_block("p2", Some(900.0)).unwrap();
    assert_eq!(current_index(&engine), Some(2));
    assert_eq!(engine.current_word().unwrap().element.text, "reader");
}

// ========================================================================
// Locator
// ========================================================================

#[test]
fn test_gap_belongs_to_preceding_word() {
    let t = table(&[(0, 100), (300, 100), (600, 100)]);
    assert_eq!(locate_uncached(&t, 150.0).index, 0);
    assert_eq!(locate_uncached(&t, 299.0).index, 0);
    assert_eq!(locate_uncached(&t, 300.0).index, 1);
    assert_eq!(locate_uncached(&t, 450.0).index, 1);
}

#[test]
fn test_positions_outside_table_clamp() {
    let t = table(&[(200, 100), (300, 100)]);
    assert_eq!(locate_uncached(&t, 0.0).index, 0);
    assert_eq!(locate_uncached(&t, -40.0).index, 0);
    assert_eq!(locate_uncached(&t, 99_999.0).index, 1);
    assert_eq!(locate_uncached(&t, f64::NAN).index, 0);
}

#[test]
fn test_cache_agrees_with_search() {
    let spans: Vec<(u64, u64)> = (0..500).map(|i| (i * 250, 200)).collect();
    let t = table(&spans);
    let mut cache = None;

    // forward, then a backward jump, then forward again
    let positions = (0..2_000)
        .map(|i| i as f64 * 31.0)
        .chain((0..200).rev().map(|i| i as f64 * 97.0))
        .chain((0..500).map(|i| i as f64 * 250.0 + 210.0));
    for position in positions {
        assert_eq!(
            locate(&t, position, &mut cache).index,
            locate_uncached(&t, position).index,
            "position {}",
            position
        );
    }
}

#[test]
fn test_random_tables_locate_every_interior_position() {
    for seed in [1_u64, 7, 42, 2024, 99_991] {
        let mut rng = Lcg(seed);
        let mut begin = rng.below(300);
        let spans: Vec<(u64, u64)> = (0..200)
            .map(|_| {
                let dur = 1 + rng.below(400);
                let span = (begin, dur);
                begin += dur + rng.below(300);
                span
            })
            .collect();
        let t = table(&spans);
        let mut cache = None;

        // visit words out of order so the cache keeps missing
        let mut order: Vec<usize> = (0..spans.len()).collect();
        for i in (1..order.len()).rev() {
            let j = rng.below(i as u64 + 1) as usize;
            order.swap(i, j);
        }

        for i in order {
            let (begin, dur) = spans[i];
            let interior = begin + rng.below(dur);
            for position in [begin, begin + dur - 1, interior] {
                let position = position as f64;
                assert_eq!(
                    locate(&t, position, &mut cache).index,
                    i,
                    "seed {} word {} position {}",
                    seed,
                    i,
                    position
                );
                assert_eq!(locate_uncached(&t, position).index, i);
            }
        }
    }
}
