//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use readalong::commands::HighlightKind;
use readalong::config::SyncConfig;
use readalong::content::StaticContent;
use readalong::events::SyncEvent;
use readalong::model::WordRef;
use readalong::runtime::{HighlightSink, ReadAlong, ScrollSink, SimulatedTransport};

/// Two blocks; `p1` wraps onto a second line at its last word
pub const LESSON: &str = r#"
line_height: 24
blocks:
  - id: p1
    audio: audio/p1.ogg
    words:
      - { map: "0,500", text: "One" }
      - { map: "500,700", text: "small" }
      - { map: "1200,300", text: "step", line: 1 }
  - id: p2
    audio: audio/p2.ogg
    words:
      - { map: "0,400", text: "for" }
      - { map: "400,400", text: "a" }
      - { map: "800,600", text: "reader", line: 1 }
"#;

pub const P1_AUDIO_MS: u64 = 2_000;
pub const P2_AUDIO_MS: u64 = 1_800;

pub type Engine = ReadAlong<StaticContent, SimulatedTransport>;

/// One call made on the highlight sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightCall {
    pub applied: bool,
    pub word_id: String,
    pub kind: HighlightKind,
    pub class_name: String,
}

#[derive(Clone, Default)]
pub struct Recorder {
    pub highlights: Rc<RefCell<Vec<HighlightCall>>>,
    pub scrolls: Rc<RefCell<Vec<(i32, u64)>>>,
    pub events: Rc<RefCell<Vec<SyncEvent>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.borrow().clone()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(|e| e.name()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }

    pub fn highlights(&self) -> Vec<HighlightCall> {
        self.highlights.borrow().clone()
    }

    pub fn clear(&self) {
        self.highlights.borrow_mut().clear();
        self.scrolls.borrow_mut().clear();
        self.events.borrow_mut().clear();
    }
}

struct RecordingSink(Recorder);

impl HighlightSink for RecordingSink {
    fn apply_class(&mut self, word: &WordRef, kind: HighlightKind, class_name: &str) {
        self.0.highlights.borrow_mut().push(HighlightCall {
            applied: true,
            word_id: word.id.clone(),
            kind,
            class_name: class_name.to_string(),
        });
    }

    fn retract_class(&mut self, word: &WordRef, kind: HighlightKind, class_name: &str) {
        self.0.highlights.borrow_mut().push(HighlightCall {
            applied: false,
            word_id: word.id.clone(),
            kind,
            class_name: class_name.to_string(),
        });
    }
}

impl ScrollSink for RecordingSink {
    fn scroll_by_offset(&mut self, delta_px: i32, duration_ms: u64) {
        self.0.scrolls.borrow_mut().push((delta_px, duration_ms));
    }
}

pub fn lesson() -> StaticContent {
    StaticContent::from_yaml_str(LESSON).expect("lesson content parses")
}

pub fn lesson_transport() -> SimulatedTransport {
    SimulatedTransport::new()
        .with_media("audio/p1.ogg", P1_AUDIO_MS)
        .with_media("audio/p2.ogg", P2_AUDIO_MS)
}

/// Engine over the lesson content with recording sinks and listener
pub fn test_engine(config: SyncConfig) -> (Engine, Recorder) {
    test_engine_with(config, lesson_transport())
}

pub fn test_engine_with(config: SyncConfig, transport: SimulatedTransport) -> (Engine, Recorder) {
    let recorder = Recorder::default();
    let mut engine = ReadAlong::new(config, lesson(), transport)
        .with_highlight_sink(RecordingSink(recorder.clone()))
        .with_scroll_sink(RecordingSink(recorder.clone()));
    let events = Rc::clone(&recorder.events);
    engine.subscribe(move |event: &SyncEvent| events.borrow_mut().push(event.clone()));
    (engine, recorder)
}

/// Index of the highlighted word, if any
pub fn current_index(engine: &Engine) -> Option<usize> {
    engine.current_word().map(|w| w.index)
}

/// Word ids carrying the `current` mark, per the engine's bookkeeping
pub fn current_marks(engine: &Engine) -> Vec<usize> {
    engine
        .applied_marks()
        .into_iter()
        .filter(|(_, kind)| *kind == HighlightKind::Current)
        .map(|(index, _)| index)
        .collect()
}
