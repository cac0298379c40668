//! Timing table - the ordered word index for the active block
//!
//! A table is built once per block load (or re-range) and never mutated
//! afterwards. Replacing it is the only way to change what is synchronized.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ContentError, SyncError};

/// Raw timing of one word as authored: `begin,dur[,end]` in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub begin: u64,
    pub dur: u64,
    /// Explicit end, overriding `begin + dur`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
}

impl WordSpan {
    pub fn new(begin: u64, dur: u64) -> Self {
        Self {
            begin,
            dur,
            end: None,
        }
    }

    pub fn with_end(begin: u64, dur: u64, end: u64) -> Self {
        Self {
            begin,
            dur,
            end: Some(end),
        }
    }

    /// Effective end of the span
    #[inline]
    pub fn end(&self) -> u64 {
        self.end.unwrap_or_else(|| self.begin.saturating_add(self.dur))
    }
}

impl FromStr for WordSpan {
    type Err = ContentError;

    /// Parse a word map such as `"7464,844"` or `"7464,844,8400"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ContentError::InvalidMap {
            map: s.to_string(),
            reason: reason.to_string(),
        };

        let mut values = Vec::with_capacity(3);
        for part in s.split(',') {
            let part = part.trim();
            let value = part
                .parse::<u64>()
                .map_err(|_| invalid(&format!("{:?} is not a millisecond value", part)))?;
            values.push(value);
        }

        match values.as_slice() {
            [begin, dur] => {
                if begin.checked_add(*dur).is_none() {
                    return Err(invalid("begin + dur overflows"));
                }
                Ok(WordSpan::new(*begin, *dur))
            }
            [begin, dur, end] => {
                if end < begin {
                    return Err(invalid("end precedes begin"));
                }
                Ok(WordSpan::with_end(*begin, *dur, *end))
            }
            _ => Err(invalid("expected begin,dur or begin,dur,end")),
        }
    }
}

/// Opaque reference to the rendered word (element id, text, layout offset)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRef {
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Vertical layout offset; an increase between consecutive words is a line break
    #[serde(default)]
    pub offset_top: i32,
}

/// Input to [`TimingTable::build`]: a span plus its rendered word
#[derive(Debug, Clone, PartialEq)]
pub struct RawWord {
    pub span: WordSpan,
    pub element: WordRef,
}

/// A timed word inside a [`TimingTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Zero-based, contiguous position within the table
    pub index: usize,
    pub begin: u64,
    pub end: u64,
    pub dur: u64,
    pub element: WordRef,
}

impl Word {
    /// Whether `position_ms` falls inside `[begin, end)`
    #[inline]
    pub fn contains(&self, position_ms: u64) -> bool {
        self.begin <= position_ms && position_ms < self.end
    }
}

/// Restricts a table to the words overlapping `[start_ms, stop_ms]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    pub start_ms: u64,
    pub stop_ms: u64,
}

impl RangeFilter {
    pub fn new(start_ms: u64, stop_ms: u64) -> Self {
        Self { start_ms, stop_ms }
    }

    /// A span qualifies if it begins inside `[start, stop)` or ends inside `(start, stop]`
    pub fn retains(&self, span: &WordSpan) -> bool {
        let begin = span.begin;
        let end = span.end();
        (self.start_ms <= begin && begin < self.stop_ms)
            || (self.start_ms < end && end <= self.stop_ms)
    }
}

/// Ordered, immutable word timings for one block (or a range of it)
#[derive(Debug, Clone, PartialEq)]
pub struct TimingTable {
    words: Vec<Word>,
    range: Option<RangeFilter>,
}

impl TimingTable {
    /// Build a table from raw words in document order
    ///
    /// Fails with [`SyncError::EmptyTimingTable`] when nothing survives the
    /// optional range filter.
    pub fn build<I>(raw: I, range: Option<RangeFilter>) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = RawWord>,
    {
        let mut retained: Vec<RawWord> = raw
            .into_iter()
            .filter(|w| range.map_or(true, |r| r.retains(&w.span)))
            .collect();

        if retained.is_empty() {
            return Err(SyncError::EmptyTimingTable);
        }

        if retained.windows(2).any(|p| p[1].span.begin < p[0].span.begin) {
            tracing::warn!("word spans are not in timing order, sorting by begin");
            retained.sort_by_key(|w| w.span.begin);
        }

        let words = retained
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Word {
                index,
                begin: raw.span.begin,
                end: raw.span.end(),
                dur: raw.span.dur,
                element: raw.element,
            })
            .collect();

        Ok(Self { words, range })
    }

    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false for a built table; kept for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Word> {
        self.words.get(index)
    }

    pub fn first(&self) -> &Word {
        &self.words[0]
    }

    pub fn last(&self) -> &Word {
        &self.words[self.words.len() - 1]
    }

    #[inline]
    pub fn is_last(&self, word: &Word) -> bool {
        word.index + 1 == self.words.len()
    }

    /// The range this table was filtered to, if any
    pub fn range(&self) -> Option<RangeFilter> {
        self.range
    }

    /// Block duration as reported to `on_start` listeners
    ///
    /// Computed as `last.begin + last.end - first.begin`, which is not the
    /// span length. Progress UIs that depend on it should not assume it is.
    pub fn block_duration(&self) -> u64 {
        let first = self.first();
        let last = self.last();
        last.begin
            .saturating_add(last.end)
            .saturating_sub(first.begin)
    }

    /// Percentage of the table completed once `word` has been reached
    pub fn percent_complete(&self, word: &Word) -> u8 {
        let pct = ((word.index + 1) as f64 / self.words.len() as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}
