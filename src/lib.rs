//! Read-along - audio/text synchronization engine
//!
//! This crate highlights words of a text block in step with its narration,
//! implementing the Elm Architecture pattern: messages in, a pure update,
//! commands out, and a small runtime that executes them.

pub mod commands;
pub mod config;
pub mod config_paths;
pub mod content;
pub mod error;
pub mod events;
pub mod messages;
pub mod model;
pub mod runtime;
pub mod scheduler;
pub mod tracing;
pub mod update;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::SyncConfig;
pub use content::{ContentSource, StaticContent};
pub use error::SyncError;
pub use events::{SyncEvent, SyncListener};
pub use messages::Msg;
pub use model::SyncModel;
pub use runtime::{PlayOptions, ReadAlong, SimulatedTransport};
