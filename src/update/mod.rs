//! Update functions for the Elm-style architecture
//!
//! All state transformations flow through these functions. Handlers never
//! touch the transport or the highlight sinks directly; they return [`Cmd`]s
//! for the runtime to execute in order.

mod control;
mod highlight;
mod input;
mod timer;
mod transport;

use crate::commands::Cmd;
use crate::content::ContentSource;
use crate::error::SyncError;
use crate::messages::Msg;
use crate::model::{PlaybackState, SyncModel};

#[cfg(debug_assertions)]
use crate::tracing::EngineSnapshot;
#[cfg(debug_assertions)]
use tracing::{debug, span, Level};

pub use control::update_control;
pub use highlight::{
    retract_all, retract_around, retract_current, select_current_word, set_word_selection,
};
pub use input::update_input;
pub use timer::update_timer;
pub use transport::update_transport;

/// Everything outside the model an update may read
#[derive(Clone, Copy)]
pub struct UpdateContext<'a> {
    /// Transport state at the moment the message is handled
    pub playback: PlaybackState,
    /// Engine clock, in milliseconds
    pub now_ms: u64,
    pub content: &'a dyn ContentSource,
}

/// Transport state with the active range stop applied
pub(crate) fn effective_playback(model: &SyncModel, ctx: &UpdateContext) -> PlaybackState {
    PlaybackState {
        stop_at_ms: model.sequencer.stop_at_ms,
        ..ctx.playback
    }
}

/// Main update function - dispatches to sub-handlers
///
/// In debug builds, this wraps with tracing instrumentation.
/// In release builds, it's a direct dispatch with zero overhead.
#[inline]
pub fn update(
    model: &mut SyncModel,
    msg: Msg,
    ctx: &UpdateContext,
) -> Result<Option<Cmd>, SyncError> {
    #[cfg(debug_assertions)]
    {
        update_traced(model, msg, ctx)
    }
    #[cfg(not(debug_assertions))]
    {
        update_inner(model, msg, ctx)
    }
}

/// Inner update logic (no tracing)
fn update_inner(
    model: &mut SyncModel,
    msg: Msg,
    ctx: &UpdateContext,
) -> Result<Option<Cmd>, SyncError> {
    match msg {
        Msg::Control(m) => control::update_control(model, m, ctx),
        Msg::Transport(m) => Ok(transport::update_transport(model, m, ctx)),
        Msg::Timer(m) => Ok(timer::update_timer(model, m, ctx)),
        Msg::Input(m) => input::update_input(model, m, ctx),
    }
}

/// Traced update wrapper (debug builds only)
///
/// Captures engine state before and after and logs the diff. Periodic
/// position updates are not logged unless they change something.
#[cfg(debug_assertions)]
fn update_traced(
    model: &mut SyncModel,
    msg: Msg,
    ctx: &UpdateContext,
) -> Result<Option<Cmd>, SyncError> {
    use crate::messages::TransportMsg;

    let is_noisy = matches!(&msg, Msg::Transport(TransportMsg::TimeUpdate));

    let msg_name = msg_type_name(&msg);
    let _span = if is_noisy {
        None
    } else {
        Some(span!(Level::DEBUG, "update", msg = %msg_name).entered())
    };

    let before = EngineSnapshot::from_model(model);

    if !is_noisy {
        debug!(
            target: "message",
            msg = %msg_name,
            position_ms = ctx.playback.position_ms,
            playing = ctx.playback.is_playing,
            "processing"
        );
    }

    let result = update_inner(model, msg, ctx);

    let after = EngineSnapshot::from_model(model);
    if let Some(diff) = before.diff(&after) {
        debug!(target: "engine", %diff, "state changed");
    }
    if let Err(ref e) = result {
        debug!(target: "engine", msg = %msg_name, error = %e, "rejected");
    }

    result
}

/// Get a display name for a message type
///
/// Uses Debug formatting to include variant names and arguments.
/// Example outputs:
/// - `Control::PlayFromWord(3)`
/// - `Transport::Seeked`
/// - `Timer::TransitionFired { generation: 7 }`
#[cfg(debug_assertions)]
fn msg_type_name(msg: &Msg) -> String {
    match msg {
        Msg::Control(m) => format!("Control::{:?}", m),
        Msg::Transport(m) => format!("Transport::{:?}", m),
        Msg::Timer(m) => format!("Timer::{:?}", m),
        Msg::Input(m) => format!("Input::{:?}", m),
    }
}
