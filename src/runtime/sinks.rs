//! Output boundaries: where highlight and scroll requests end up

use crate::commands::HighlightKind;
use crate::model::WordRef;

/// Applies and removes highlight classes on rendered words
pub trait HighlightSink {
    fn apply_class(&mut self, word: &WordRef, kind: HighlightKind, class_name: &str);
    fn retract_class(&mut self, word: &WordRef, kind: HighlightKind, class_name: &str);
}

/// Scrolls the rendered text when highlighting wraps onto a new line
pub trait ScrollSink {
    fn scroll_by_offset(&mut self, delta_px: i32, duration_ms: u64);
}

/// Discards everything; the default until real sinks are attached
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl HighlightSink for NullSink {
    fn apply_class(&mut self, _word: &WordRef, _kind: HighlightKind, _class_name: &str) {}
    fn retract_class(&mut self, _word: &WordRef, _kind: HighlightKind, _class_name: &str) {}
}

impl ScrollSink for NullSink {
    fn scroll_by_offset(&mut self, _delta_px: i32, _duration_ms: u64) {}
}
