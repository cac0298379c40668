//! Command-line argument parsing for the simulator
//!
//! Supports:
//! - Playing a whole block, optionally from a word
//! - Playing a millisecond range of a block
//! - Overriding rate and auto-continue from the config file
//! - Simulating a transport that starts late

use clap::Parser;
use std::path::PathBuf;

/// Simulate read-along playback of a content file
#[derive(Parser, Debug)]
#[command(
    name = "readalong",
    version,
    about = "Simulate word-level read-along highlighting"
)]
pub struct CliArgs {
    /// YAML or JSON content file
    #[arg(value_name = "CONTENT")]
    pub content: PathBuf,

    /// Block to play (defaults to the first block)
    #[arg(short, long, value_name = "ID")]
    pub block: Option<String>,

    /// Playback rate, clamped to 0.5..=2.0
    #[arg(short, long, value_name = "R")]
    pub rate: Option<f64>,

    /// Start from word N (0-indexed)
    #[arg(long, value_name = "N", conflicts_with = "range")]
    pub from_word: Option<usize>,

    /// Play only START..STOP milliseconds of the block
    #[arg(long, num_args = 2, value_names = ["START", "STOP"])]
    pub range: Option<Vec<u64>>,

    /// Config file to use instead of the user config
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Continue into following blocks
    #[arg(long)]
    pub auto_continue: bool,

    /// Delay before the simulated transport reports playing
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub start_latency: u64,

    /// Clock resolution of the printed timeline
    #[arg(long, value_name = "MS", default_value_t = 10)]
    pub step: u64,
}

/// What to play
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackMode {
    Block { from_word: Option<usize> },
    Range { start_ms: u64, stop_ms: u64 },
}

/// Run settings derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub content: PathBuf,
    pub block: Option<String>,
    pub mode: PlaybackMode,
    pub rate: Option<f64>,
    pub config_path: Option<PathBuf>,
    pub auto_continue: bool,
    pub start_latency_ms: u64,
    pub step_ms: u64,
}

impl CliArgs {
    /// Convert parsed CLI args into run settings
    pub fn into_config(self) -> Result<RunConfig, String> {
        let mode = match self.range.as_deref() {
            Some(&[start_ms, stop_ms]) => {
                if start_ms >= stop_ms {
                    return Err(format!(
                        "Range start {} must be before stop {}",
                        start_ms, stop_ms
                    ));
                }
                PlaybackMode::Range { start_ms, stop_ms }
            }
            Some(_) => return Err("Range takes exactly START and STOP".to_string()),
            None => PlaybackMode::Block {
                from_word: self.from_word,
            },
        };

        if let Some(rate) = self.rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(format!("Invalid playback rate: {}", rate));
            }
        }

        Ok(RunConfig {
            content: self.content,
            block: self.block,
            mode,
            rate: self.rate,
            config_path: self.config,
            auto_continue: self.auto_continue,
            start_latency_ms: self.start_latency,
            step_ms: self.step.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            content: PathBuf::from("lesson.yaml"),
            block: None,
            rate: None,
            from_word: None,
            range: None,
            config: None,
            auto_continue: false,
            start_latency: 0,
            step: 10,
        }
    }

    #[test]
    fn test_default_plays_whole_block() {
        let config = args().into_config().unwrap();
        assert_eq!(config.mode, PlaybackMode::Block { from_word: None });
    }

    #[test]
    fn test_range_mode() {
        let config = CliArgs {
            range: Some(vec![500, 1200]),
            ..args()
        }
        .into_config()
        .unwrap();
        assert_eq!(
            config.mode,
            PlaybackMode::Range {
                start_ms: 500,
                stop_ms: 1200
            }
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = CliArgs {
            range: Some(vec![1200, 500]),
            ..args()
        }
        .into_config();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let result = CliArgs {
            rate: Some(f64::NAN),
            ..args()
        }
        .into_config();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_step_is_raised() {
        let config = CliArgs { step: 0, ..args() }.into_config().unwrap();
        assert_eq!(config.step_ms, 1);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = CliArgs::try_parse_from([
            "readalong",
            "lesson.yaml",
            "--block",
            "p2",
            "--range",
            "500",
            "1200",
        ])
        .unwrap();
        assert_eq!(args.block.as_deref(), Some("p2"));
        assert_eq!(args.range, Some(vec![500, 1200]));
    }
}
