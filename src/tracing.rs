//! Tracing infrastructure for development diagnostics
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=transition=debug,timer=trace` - scoped filtering
//! - `RUST_LOG=readalong::update=debug` - module-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/readalong/logs/readalong.log` with daily rotation.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::model::{Phase, SyncModel};

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG (default `warn`). The file layer always
/// logs at debug level.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, "readalong.log");
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// Lightweight snapshot of engine state for diffing around an update
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub block_id: Option<String>,
    pub phase: Phase,
    pub current_word: Option<usize>,
    pub pending_generation: Option<u64>,
    pub playback_rate: f64,
}

impl EngineSnapshot {
    pub fn from_model(model: &SyncModel) -> Self {
        Self {
            block_id: model.sequencer.block_id.clone(),
            phase: model.engine.phase,
            current_word: model.engine.current_word,
            pending_generation: model.engine.pending_transition.map(|h| h.generation),
            playback_rate: model.sequencer.playback_rate,
        }
    }

    /// Generate a diff description between two snapshots
    pub fn diff(&self, other: &EngineSnapshot) -> Option<String> {
        let mut changes = Vec::new();

        if self.block_id != other.block_id {
            changes.push(format!("block: {:?} → {:?}", self.block_id, other.block_id));
        }
        if self.phase != other.phase {
            changes.push(format!("phase: {:?} → {:?}", self.phase, other.phase));
        }
        if self.current_word != other.current_word {
            changes.push(format!(
                "word: {:?} → {:?}",
                self.current_word, other.current_word
            ));
        }
        if self.pending_generation != other.pending_generation {
            changes.push(format!(
                "timer: {:?} → {:?}",
                self.pending_generation, other.pending_generation
            ));
        }
        if self.playback_rate != other.playback_rate {
            changes.push(format!(
                "rate: {} → {}",
                self.playback_rate, other.playback_rate
            ));
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> EngineSnapshot {
        EngineSnapshot {
            block_id: Some("p1".to_string()),
            phase: Phase::Playing,
            current_word: Some(0),
            pending_generation: Some(1),
            playback_rate: 1.0,
        }
    }

    #[test]
    fn test_identical_snapshots_have_no_diff() {
        assert_eq!(snapshot().diff(&snapshot()), None);
    }

    #[test]
    fn test_diff_lists_changes() {
        let before = snapshot();
        let after = EngineSnapshot {
            current_word: Some(1),
            pending_generation: Some(2),
            ..snapshot()
        };
        assert_eq!(
            before.diff(&after).unwrap(),
            "word: Some(0) → Some(1); timer: Some(1) → Some(2)"
        );
    }
}
