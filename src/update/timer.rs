//! Timer handlers
//!
//! A fired timer is only honored if its generation matches the handle the
//! model is still holding. Anything else was cancelled after it was queued.

use crate::commands::{Cmd, TransportCmd};
use crate::error::SyncError;
use crate::messages::TimerMsg;
use crate::model::{PlaybackState, SyncModel};
use crate::scheduler::transition_target;

use super::control::finalize_block;
use super::highlight::{retract_current, select_current_word};
use super::UpdateContext;

/// Handle a fired timer
pub fn update_timer(model: &mut SyncModel, msg: TimerMsg, ctx: &UpdateContext) -> Option<Cmd> {
    let mut cmds = Vec::new();
    let playback = super::effective_playback(model, ctx);

    match msg {
        TimerMsg::TransitionFired { generation } => {
            match model.engine.pending_transition {
                Some(handle) if handle.generation == generation => {}
                _ => {
                    tracing::trace!(target: "timer", generation, "stale transition ignored");
                    return None;
                }
            }
            model.engine.pending_transition = None;

            let (Some(table), Some(index)) = (model.table.as_ref(), model.engine.current_word)
            else {
                return None;
            };
            let Some(word) = table.get(index) else {
                return None;
            };
            let (target, is_final) = transition_target(word, table, playback.stop_at_ms);
            tracing::debug!(
                target: "transition",
                word = index,
                target_ms = target,
                position_ms = playback.position_ms,
                is_final,
                "transition fired"
            );

            if is_final {
                finalize_block(model, ctx, playback.is_playing, &mut cmds);
                return Cmd::from_vec(cmds);
            }
            if !playback.is_playing {
                select_current_word(model, &playback, &mut cmds);
                return Cmd::from_vec(cmds);
            }

            retract_current(model, index, &mut cmds);
            // the timer can land a hair before the next word when rounding
            let advanced = PlaybackState {
                position_ms: playback.position_ms.max(target),
                ..playback
            };
            select_current_word(model, &advanced, &mut cmds);
        }

        TimerMsg::StallCheckFired { generation } => {
            let watch = match model.engine.stall_watch {
                Some(watch) if watch.handle.generation == generation => watch,
                _ => return None,
            };
            model.engine.stall_watch = None;

            if playback.is_playing && playback.position_ms == watch.position_ms {
                let err = SyncError::StalePositionDetected {
                    position_ms: watch.position_ms,
                };
                tracing::warn!("{}", err);
                cmds.push(Cmd::Transport(TransportCmd::Seek(
                    watch.position_ms + model.config.stall_nudge_ms,
                )));
            }
        }
    }

    Cmd::from_vec(cmds)
}
