//! readalong - simulate word-level highlighting of a content file
//!
//! Plays a block on a virtual clock against a simulated transport and prints
//! the resulting timeline of events, highlight changes, and scrolls.

mod cli;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use readalong::commands::HighlightKind;
use readalong::config::SyncConfig;
use readalong::content::{ContentSource, StaticContent};
use readalong::events::SyncEvent;
use readalong::model::WordRef;
use readalong::runtime::{
    HighlightSink, PlayOptions, ReadAlong, ScrollSink, SimulatedTransport, Transport,
};

use cli::{CliArgs, PlaybackMode, RunConfig};

/// Silence after the last word of each simulated recording
const TRAILING_AUDIO_MS: u64 = 500;

type Timeline = Rc<RefCell<Vec<String>>>;

/// Sink that writes every request into the shared timeline
struct TimelineSink(Timeline);

impl HighlightSink for TimelineSink {
    fn apply_class(&mut self, word: &WordRef, _kind: HighlightKind, class_name: &str) {
        self.0
            .borrow_mut()
            .push(format!("+{:<16} {} {:?}", class_name, word.id, word.text));
    }

    fn retract_class(&mut self, word: &WordRef, _kind: HighlightKind, class_name: &str) {
        self.0
            .borrow_mut()
            .push(format!("-{:<16} {} {:?}", class_name, word.id, word.text));
    }
}

impl ScrollSink for TimelineSink {
    fn scroll_by_offset(&mut self, delta_px: i32, duration_ms: u64) {
        self.0
            .borrow_mut()
            .push(format!("scroll {:+}px over {}ms", delta_px, duration_ms));
    }
}

fn describe(event: &SyncEvent) -> String {
    match event {
        SyncEvent::Start {
            block_id,
            words,
            duration_ms,
            rate,
        } => format!(
            "on_start block={} words={} duration={}ms rate={}",
            block_id,
            words.len(),
            duration_ms,
            rate
        ),
        SyncEvent::Pause { word } => format!("on_pause word={}", word.index),
        SyncEvent::Resume { word } => format!("on_resume word={}", word.index),
        SyncEvent::Move { word } => format!("on_move word={}", word.index),
        SyncEvent::Newline {
            prev_offset,
            new_offset,
            percent_complete,
        } => format!(
            "on_newline {} -> {} ({}%)",
            prev_offset, new_offset, percent_complete
        ),
        SyncEvent::Complete { block_id } => format!("on_complete block={}", block_id),
    }
}

fn load_config(run: &RunConfig) -> Result<SyncConfig> {
    let mut config = match &run.config_path {
        Some(path) => SyncConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SyncConfig::load(),
    };
    if let Some(rate) = run.rate {
        config.playback_rate = rate;
    }
    if run.auto_continue {
        config.auto_continue = true;
    }
    config.validated().context("Invalid configuration")
}

fn simulated_transport(content: &StaticContent, start_latency_ms: u64) -> SimulatedTransport {
    let mut transport = SimulatedTransport::new().with_start_latency(start_latency_ms);
    for id in content.block_ids() {
        if let Some(block) = content.block(id) {
            let duration_ms = block.spoken_until_ms().saturating_add(TRAILING_AUDIO_MS);
            transport = transport.with_media(block.audio_ref, duration_ms);
        }
    }
    transport
}

fn main() -> Result<()> {
    readalong::tracing::init();

    let run = CliArgs::parse().into_config().map_err(|e| anyhow!(e))?;
    let config = load_config(&run)?;

    let content = StaticContent::load(&run.content)
        .with_context(|| format!("Failed to load content {}", run.content.display()))?;
    let block_id = match &run.block {
        Some(id) => id.clone(),
        None => content
            .first_block_id()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("{} has no blocks", run.content.display()))?,
    };

    let transport = simulated_transport(&content, run.start_latency_ms);
    let timeline: Timeline = Rc::default();
    let mut engine = ReadAlong::new(config, content, transport)
        .with_highlight_sink(TimelineSink(Rc::clone(&timeline)))
        .with_scroll_sink(TimelineSink(Rc::clone(&timeline)));
    let events = Rc::clone(&timeline);
    engine.subscribe(move |event: &SyncEvent| events.borrow_mut().push(describe(event)));

    match run.mode {
        PlaybackMode::Block { from_word } => engine.play_block(
            &block_id,
            PlayOptions {
                from_word,
                ..PlayOptions::default()
            },
        )?,
        PlaybackMode::Range { start_ms, stop_ms } => {
            engine.play_range(&block_id, start_ms, stop_ms)?
        }
    }

    let flush = |now_ms: u64| {
        for line in timeline.borrow_mut().drain(..) {
            println!("{:>8}ms  {}", now_ms, line);
        }
    };
    flush(engine.now_ms());

    loop {
        engine.advance(run.step_ms);
        flush(engine.now_ms());

        let playing = engine.transport().snapshot().is_playing;
        if !playing && engine.timers().pending() == 0 {
            break;
        }
    }

    if let Some(word) = engine.current_word() {
        println!(
            "stopped in block {} at word {} ({:?})",
            engine.block_id().unwrap_or("-"),
            word.index,
            engine.phase()
        );
    }
    Ok(())
}
