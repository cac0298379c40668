//! Error types for the synchronization engine
//!
//! Structural errors (empty table, missing block) are returned to the caller
//! and leave the model untouched. Transport glitches are only constructed so
//! they can be logged; the update loop recovers from them locally.

use thiserror::Error;

/// Errors surfaced by engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The block (or the requested range of it) has no addressable words
    #[error("nothing to synchronize: timing table is empty")]
    EmptyTimingTable,

    /// The content source has no block with this id
    #[error("block not found: {0}")]
    BlockNotFound(String),

    /// The transport refused or failed an asynchronous play request
    #[error("transport rejected play: {0}")]
    TransportRejectedPlay(String),

    /// The transport position did not advance after a seek
    #[error("transport stalled at {position_ms}ms after seek")]
    StalePositionDetected { position_ms: f64 },

    /// A word index that is not part of the active timing table
    #[error("word {0} is not in the active timing table")]
    UnknownWord(usize),

    /// An operation that needs a loaded block was called before any load
    #[error("no block loaded")]
    NoBlockLoaded,
}

/// Errors produced while reading content files and word maps
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("invalid word map {map:?}: {reason}")]
    InvalidMap { map: String, reason: String },

    #[error("block {0:?} is defined more than once")]
    DuplicateBlock(String),

    #[error("failed to parse content: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while validating configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("playback rate must be a finite number, got {0}")]
    InvalidRate(f64),

    #[error("trail window must be at least 1")]
    EmptyTrailWindow,

    #[error("newline flush window ({flush}) must cover the trail window ({trail})")]
    FlushWindowTooSmall { flush: usize, trail: usize },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to read config: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::BlockNotFound("p3".to_string());
        assert_eq!(err.to_string(), "block not found: p3");
    }

    #[test]
    fn stall_display() {
        let err = SyncError::StalePositionDetected { position_ms: 1500.0 };
        assert_eq!(err.to_string(), "transport stalled at 1500ms after seek");
    }

    #[test]
    fn content_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ContentError = io_err.into();
        assert!(matches!(err, ContentError::Io(_)));
    }
}
