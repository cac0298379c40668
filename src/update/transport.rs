//! Transport event handlers
//!
//! Every handler that can move the playhead cancels the pending transition
//! before re-arming, so at most one transition is ever outstanding.

use crate::commands::{Cmd, TransportCmd};
use crate::error::SyncError;
use crate::events::SyncEvent;
use crate::messages::TransportMsg;
use crate::model::{locate, Phase, PlaybackState, StallWatch, SyncModel, TimerKind};
use crate::scheduler::cancel_transition;

use super::control::finalize_block;
use super::highlight::{retract_all, select_current_word};
use super::UpdateContext;

/// Handle a transport notification
pub fn update_transport(model: &mut SyncModel, msg: TransportMsg, ctx: &UpdateContext) -> Option<Cmd> {
    let mut cmds = Vec::new();
    let playback = super::effective_playback(model, ctx);

    match msg {
        TransportMsg::Play => {
            if model.table.is_none() {
                return None;
            }
            model.engine.phase = Phase::Playing;
            select_current_word(model, &playback, &mut cmds);
        }

        TransportMsg::Playing => {
            if let Some(latency) = model.sequencer.record_playing(ctx.now_ms) {
                tracing::debug!(latency_ms = latency, "transport started");
            }
            if model.table.is_none() || !playback.is_playing {
                return Cmd::from_vec(cmds);
            }
            model.engine.phase = Phase::Playing;

            // position may have moved while the transport was starting up
            select_current_word(model, &playback, &mut cmds);

            if let (Some(0), Some(table), Some(block_id)) = (
                model.engine.current_word,
                model.table.as_ref(),
                model.sequencer.block_id.clone(),
            ) {
                cmds.push(Cmd::Emit(SyncEvent::Start {
                    block_id,
                    words: table.words().to_vec(),
                    duration_ms: table.block_duration(),
                    rate: model.sequencer.playback_rate,
                }));
            }
        }

        TransportMsg::Pause => {
            cmds.extend(cancel_transition(model));
            cancel_stall_watch(model, &mut cmds);
            if model.engine.phase != Phase::Playing {
                return Cmd::from_vec(cmds);
            }
            model.engine.phase = Phase::Paused;

            // a word always stays selected while paused
            select_current_word(model, &playback, &mut cmds);
            if let Some(word) = model.current_word() {
                let is_last = model.table.as_ref().is_some_and(|t| t.is_last(word));
                if !is_last {
                    cmds.push(Cmd::Emit(SyncEvent::Pause { word: word.clone() }));
                }
            }
        }

        TransportMsg::Seeked => {
            if model.table.is_none() {
                return None;
            }
            cancel_stall_watch(model, &mut cmds);
            cmds.extend(cancel_transition(model));

            if playback.is_playing && model.sequencer.past_stop(playback.position_ms) {
                finalize_block(model, ctx, true, &mut cmds);
                return Cmd::from_vec(cmds);
            }

            retract_all(model, &mut cmds);
            if playback.is_playing {
                model.engine.phase = Phase::Playing;
            } else if model.engine.phase == Phase::Ended {
                model.engine.phase = Phase::Paused;
            }
            select_current_word(model, &playback, &mut cmds);

            if playback.is_playing {
                let handle = model.next_handle(TimerKind::StallCheck);
                model.engine.stall_watch = Some(StallWatch {
                    handle,
                    position_ms: playback.position_ms,
                });
                cmds.push(Cmd::ArmTimer {
                    handle,
                    delay_ms: model.config.stall_grace_ms,
                });
                if let Some(word) = model.current_word() {
                    cmds.push(Cmd::Emit(SyncEvent::Move { word: word.clone() }));
                }
            }
        }

        TransportMsg::RateChange(rate) => {
            model.sequencer.set_rate(rate);
            let clamped = model.sequencer.playback_rate;
            if clamped != rate {
                tracing::debug!(reported = rate, clamped, "transport rate out of range");
                cmds.push(Cmd::Transport(TransportCmd::SetRate(clamped)));
            }
            let playback = PlaybackState {
                playback_rate: clamped,
                ..playback
            };
            select_current_word(model, &playback, &mut cmds);
        }

        TransportMsg::TimeUpdate => {
            let Some(table) = model.table.as_ref() else {
                return None;
            };
            if !playback.is_playing || model.engine.phase != Phase::Playing {
                return None;
            }
            if model.sequencer.past_stop(playback.position_ms) {
                tracing::debug!(position_ms = playback.position_ms, "range stop reached");
                finalize_block(model, ctx, true, &mut cmds);
                return Cmd::from_vec(cmds);
            }

            let mut scratch = model.engine.last_resolved;
            let resolved = locate(table, playback.position_ms, &mut scratch).index;
            if model.engine.current_word != Some(resolved) {
                tracing::debug!(
                    target: "transition",
                    expected = ?model.engine.current_word,
                    resolved,
                    "highlight drifted from position, resyncing"
                );
                select_current_word(model, &playback, &mut cmds);
            }
        }

        TransportMsg::Ended => {
            if model.table.is_some() {
                finalize_block(model, ctx, false, &mut cmds);
            }
        }

        TransportMsg::PlayRejected(reason) => {
            let err = SyncError::TransportRejectedPlay(reason);
            tracing::warn!("{}", err);
            model.sequencer.play_requested_at = None;
            cmds.extend(cancel_transition(model));
            cancel_stall_watch(model, &mut cmds);
            if model.table.is_some() && model.engine.phase != Phase::Ended {
                model.engine.phase = Phase::Paused;
            }
        }
    }

    Cmd::from_vec(cmds)
}

fn cancel_stall_watch(model: &mut SyncModel, cmds: &mut Vec<Cmd>) {
    if model.engine.stall_watch.take().is_some() {
        cmds.push(Cmd::CancelTimer(TimerKind::StallCheck));
    }
}
