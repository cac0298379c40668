//! Message types for the Elm-style architecture
//!
//! All state changes flow through these message types.

/// Public operations on the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    /// Load a block without playing, optionally positioned at `from_ms`
    LoadBlock {
        block_id: String,
        from_ms: Option<f64>,
    },
    /// Load a block and start playing it
    PlayBlock {
        block_id: String,
        /// Word index to start from
        from_word: Option<usize>,
        rate: Option<f64>,
        /// Layout offset the first line-break comparison starts from
        scroll_anchor: Option<i32>,
    },
    /// Jump to a word of the loaded block and play from there
    PlayFromWord(usize),
    /// Play only one word of the loaded block
    PlayWord(usize),
    /// Play `[start_ms, stop_ms]` of a block, then stop
    PlayRange {
        block_id: String,
        start_ms: u64,
        stop_ms: u64,
    },
    Pause,
    Resume,
    ChangeRate(f64),
    /// Move the playhead of the loaded block
    SetCurrentTime(f64),
}

/// Notifications from the playback transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportMsg {
    /// Play was requested and accepted
    Play,
    /// Audio is actually advancing
    Playing,
    Pause,
    Seeked,
    RateChange(f64),
    /// Coarse periodic position update
    TimeUpdate,
    Ended,
    /// The play request failed asynchronously
    PlayRejected(String),
}

/// A scheduled task came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMsg {
    TransitionFired { generation: u64 },
    StallCheckFired { generation: u64 },
}

/// Input from an adapter the engine does not own (keyboard, pointer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMsg {
    Spacebar,
    WordClicked(usize),
    /// Enter pressed on a focused word
    WordEnter(usize),
    WordDoubleClicked(usize),
}

/// Top-level message type
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Control(ControlMsg),
    Transport(TransportMsg),
    Timer(TimerMsg),
    Input(InputMsg),
}
