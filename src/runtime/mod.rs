//! Runtime module - drives the engine against its collaborators
//!
//! - `engine` - [`ReadAlong`], the message loop on a virtual clock
//! - `timers` - one-slot-per-kind timer queue
//! - `transport` - transport trait and a deterministic simulation
//! - `sinks` - highlight and scroll outputs

pub mod engine;
pub mod sinks;
pub mod timers;
pub mod transport;

pub use engine::{PlayOptions, ReadAlong};
pub use sinks::{HighlightSink, NullSink, ScrollSink};
pub use timers::{TimerQueue, TimerStats};
pub use transport::{SimulatedTransport, Transport, TIME_UPDATE_INTERVAL_MS};
