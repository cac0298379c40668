//! The read-along engine: owns the model and its collaborators and runs the
//! message loop on a virtual clock
//!
//! Messages are handled one at a time. Transport events produced while
//! executing a command list are queued and dispatched afterwards, oldest
//! first, so a handler always runs to completion before the next one starts.

use crate::commands::{Cmd, HighlightKind, IntentOp, TransportCmd};
use crate::config::SyncConfig;
use crate::content::ContentSource;
use crate::error::SyncError;
use crate::events::SyncListener;
use crate::messages::{ControlMsg, InputMsg, Msg, TransportMsg};
use crate::model::{Phase, SyncModel, Word};
use crate::update::{update, UpdateContext};

use super::sinks::{HighlightSink, NullSink, ScrollSink};
use super::timers::{TimerQueue, TimerStats};
use super::transport::Transport;

/// Optional arguments to [`ReadAlong::play_block`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayOptions {
    pub from_word: Option<usize>,
    pub rate: Option<f64>,
    /// Layout offset the first line-break comparison starts from
    pub scroll_anchor: Option<i32>,
}

/// Audio/text synchronization engine
pub struct ReadAlong<C, T> {
    model: SyncModel,
    content: C,
    transport: T,
    timers: TimerQueue,
    highlights: Box<dyn HighlightSink>,
    scroll: Box<dyn ScrollSink>,
    listeners: Vec<Box<dyn SyncListener>>,
    now_ms: u64,
}

impl<C: ContentSource, T: Transport> ReadAlong<C, T> {
    pub fn new(config: SyncConfig, content: C, transport: T) -> Self {
        Self {
            model: SyncModel::new(config),
            content,
            transport,
            timers: TimerQueue::new(),
            highlights: Box::new(NullSink),
            scroll: Box::new(NullSink),
            listeners: Vec::new(),
            now_ms: 0,
        }
    }

    pub fn with_highlight_sink(mut self, sink: impl HighlightSink + 'static) -> Self {
        self.highlights = Box::new(sink);
        self
    }

    pub fn with_scroll_sink(mut self, sink: impl ScrollSink + 'static) -> Self {
        self.scroll = Box::new(sink);
        self
    }

    /// Register a listener for [`SyncEvent`](crate::events::SyncEvent)s
    pub fn subscribe(&mut self, listener: impl SyncListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Load a block without playing it
    pub fn load_block(&mut self, block_id: &str, from_ms: Option<f64>) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::LoadBlock {
            block_id: block_id.to_string(),
            from_ms,
        }))
    }

    pub fn play_block(&mut self, block_id: &str, options: PlayOptions) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::PlayBlock {
            block_id: block_id.to_string(),
            from_word: options.from_word,
            rate: options.rate,
            scroll_anchor: options.scroll_anchor,
        }))
    }

    pub fn play_from_word(&mut self, index: usize) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::PlayFromWord(index)))
    }

    pub fn play_word(&mut self, index: usize) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::PlayWord(index)))
    }

    /// Play `[start_ms, stop_ms]` of a block once
    pub fn play_range(&mut self, block_id: &str, start_ms: u64, stop_ms: u64) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::PlayRange {
            block_id: block_id.to_string(),
            start_ms,
            stop_ms,
        }))
    }

    pub fn pause(&mut self) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::Pause))
    }

    pub fn resume(&mut self) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::Resume))
    }

    /// Change the playback rate; clamped to the supported range
    pub fn change_rate(&mut self, rate: f64) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::ChangeRate(rate)))
    }

    pub fn set_current_time(&mut self, position_ms: f64) -> Result<(), SyncError> {
        self.dispatch(Msg::Control(ControlMsg::SetCurrentTime(position_ms)))
    }

    /// The highlighted word, or the word playback would resume from
    pub fn current_word(&self) -> Option<&Word> {
        self.model.current_word()
    }

    /// Deliver an event from a transport that pushes rather than being polled
    pub fn handle_transport(&mut self, msg: TransportMsg) {
        if let Err(e) = self.dispatch(Msg::Transport(msg)) {
            tracing::warn!("transport event rejected: {}", e);
        }
    }

    /// Deliver a gesture from an input adapter
    pub fn handle_input(&mut self, msg: InputMsg) -> Result<(), SyncError> {
        self.dispatch(Msg::Input(msg))
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// Advance the clock by `elapsed_ms`, stepping through every timer and
    /// transport event on the way
    pub fn advance(&mut self, elapsed_ms: u64) {
        let until = self.now_ms.saturating_add(elapsed_ms);
        loop {
            self.fire_due();
            if self.now_ms >= until {
                break;
            }
            let step = self
                .next_wakeup()
                .map_or(until, |at| at.min(until))
                .saturating_sub(self.now_ms)
                .max(1);
            self.transport.elapse(step);
            self.now_ms += step;
            self.pump();
        }
    }

    /// Fire every timer due at the current clock reading; returns how many fired
    pub fn fire_due(&mut self) -> usize {
        let mut fired = 0;
        while let Some(msg) = self.timers.pop_due(self.now_ms) {
            fired += 1;
            if let Err(e) = self.dispatch(Msg::Timer(msg)) {
                tracing::warn!(target: "timer", "timer handler failed: {}", e);
            }
        }
        fired
    }

    /// Advance until nothing is scheduled or `limit_ms` has passed; returns
    /// the elapsed time
    pub fn run_until_idle(&mut self, limit_ms: u64) -> u64 {
        let start = self.now_ms;
        let deadline = start.saturating_add(limit_ms);
        while self.now_ms < deadline {
            let Some(at) = self.next_wakeup() else {
                break;
            };
            self.advance(at.min(deadline).saturating_sub(self.now_ms).max(1));
        }
        self.now_ms - start
    }

    fn next_wakeup(&self) -> Option<u64> {
        let timer = self.timers.next_due();
        let transport = self.transport.next_event_in().map(|d| self.now_ms + d);
        match (timer, transport) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> Phase {
        self.model.phase()
    }

    /// Words of the active timing table
    pub fn words(&self) -> &[Word] {
        self.model.table.as_ref().map(|t| t.words()).unwrap_or(&[])
    }

    pub fn block_duration(&self) -> Option<u64> {
        self.model.table.as_ref().map(|t| t.block_duration())
    }

    pub fn block_id(&self) -> Option<&str> {
        self.model.sequencer.block_id.as_deref()
    }

    pub fn playback_rate(&self) -> f64 {
        self.model.sequencer.playback_rate
    }

    /// Highlight marks currently applied, by word index
    pub fn applied_marks(&self) -> Vec<(usize, HighlightKind)> {
        self.model.engine.applied_marks()
    }

    pub fn timer_stats(&self) -> TimerStats {
        self.timers.stats()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn model(&self) -> &SyncModel {
        &self.model
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    // ========================================================================
    // Message loop
    // ========================================================================

    fn dispatch(&mut self, msg: Msg) -> Result<(), SyncError> {
        if let Some(cmd) = self.update(msg)? {
            self.execute(cmd);
        }
        self.pump();
        Ok(())
    }

    fn update(&mut self, msg: Msg) -> Result<Option<Cmd>, SyncError> {
        let ctx = UpdateContext {
            playback: self.transport.snapshot(),
            now_ms: self.now_ms,
            content: &self.content,
        };
        update(&mut self.model, msg, &ctx)
    }

    /// Dispatch queued transport events until the transport goes quiet
    fn pump(&mut self) {
        loop {
            let events = self.transport.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match self.update(Msg::Transport(event)) {
                    Ok(Some(cmd)) => self.execute(cmd),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("transport event rejected: {}", e),
                }
            }
        }
    }

    fn execute(&mut self, cmd: Cmd) {
        for cmd in cmd.into_flat() {
            match cmd {
                Cmd::None | Cmd::Batch(_) => {}

                Cmd::Transport(command) => self.execute_transport(command),

                Cmd::Highlight(intent) => {
                    let class_name = intent.kind.class_name(&self.model.config.classes);
                    match intent.op {
                        IntentOp::Apply => {
                            self.highlights
                                .apply_class(&intent.element, intent.kind, class_name)
                        }
                        IntentOp::Retract => {
                            self.highlights
                                .retract_class(&intent.element, intent.kind, class_name)
                        }
                    }
                }

                Cmd::Scroll {
                    delta_px,
                    duration_ms,
                } => self.scroll.scroll_by_offset(delta_px, duration_ms),

                Cmd::ArmTimer { handle, delay_ms } => {
                    self.timers.arm(handle, self.now_ms, delay_ms)
                }

                Cmd::CancelTimer(kind) => {
                    self.timers.cancel(kind);
                }

                Cmd::Emit(event) => {
                    tracing::debug!(target: "event", event = event.name(), at_ms = self.now_ms, "emit");
                    for listener in &mut self.listeners {
                        listener.on_event(&event);
                    }
                }
            }
        }
    }

    fn execute_transport(&mut self, command: TransportCmd) {
        tracing::trace!(target: "transport", ?command, "execute");
        match command {
            TransportCmd::SetSource(audio_ref) => self.transport.set_source(&audio_ref),
            TransportCmd::Play => self.transport.play(),
            TransportCmd::Pause => self.transport.pause(),
            TransportCmd::Seek(position_ms) => self.transport.seek(position_ms),
            TransportCmd::SetRate(rate) => self.transport.set_rate(rate),
        }
    }
}
