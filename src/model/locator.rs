//! Word locator - resolves a playback position to the word being spoken
//!
//! The last resolved word is cached: while playback stays inside it, lookups
//! are O(1). Otherwise a binary search over `begin` finds the owner.

use super::timing::{TimingTable, Word};

/// Round a transport position (fractional ms, possibly negative) to a table position
#[inline]
pub fn position_to_ms(position_ms: f64) -> u64 {
    if position_ms.is_finite() && position_ms > 0.0 {
        position_ms.round() as u64
    } else {
        0
    }
}

/// Resolve the word owning `position_ms`, updating `cache` with its index
///
/// - A position exactly on a boundary belongs to the later word.
/// - A position inside a gap between words belongs to the preceding word.
/// - Positions before the first word or past the last clamp to those words;
///   callers detect block end themselves.
pub fn locate<'t>(table: &'t TimingTable, position_ms: f64, cache: &mut Option<usize>) -> &'t Word {
    let pos = position_to_ms(position_ms);

    if let Some(word) = cache.and_then(|index| table.get(index)) {
        if word.contains(pos) {
            return word;
        }
    }

    let words = table.words();
    let after = words.partition_point(|w| w.begin <= pos);
    let index = after.saturating_sub(1);

    *cache = Some(index);
    &words[index]
}

/// Like [`locate`], without touching any cache
pub fn locate_uncached(table: &TimingTable, position_ms: f64) -> &Word {
    let mut scratch = None;
    locate(table, position_ms, &mut scratch)
}
