//! Control operations - the engine's public surface as update handlers
//!
//! Structural failures (unknown block, empty table, unknown word) are
//! detected before anything is mutated, so a failed operation leaves the
//! model exactly as it was.

use crate::commands::{Cmd, TransportCmd};
use crate::content::BlockContent;
use crate::error::SyncError;
use crate::events::SyncEvent;
use crate::messages::ControlMsg;
use crate::model::{
    locate, resolve_block, Phase, PlaybackState, RangeFilter, SyncModel, TimerKind, TimingTable,
};
use crate::scheduler::cancel_transition;

use super::highlight::{retract_all, select_current_word};
use super::UpdateContext;

/// Handle a control message
pub fn update_control(
    model: &mut SyncModel,
    msg: ControlMsg,
    ctx: &UpdateContext,
) -> Result<Option<Cmd>, SyncError> {
    let mut cmds = Vec::new();

    match msg {
        ControlMsg::LoadBlock { block_id, from_ms } => {
            let (block, table) = resolve_block(ctx.content, &block_id, None)?;
            install_block(model, &block, table, from_ms, ctx.playback.is_playing, &mut cmds);
        }

        ControlMsg::PlayBlock {
            block_id,
            from_word,
            rate,
            scroll_anchor,
        } => {
            play_block(
                model,
                &block_id,
                from_word,
                rate,
                scroll_anchor,
                ctx,
                ctx.playback.is_playing,
                &mut cmds,
            )?;
        }

        ControlMsg::PlayFromWord(index) => play_from_word(model, index, ctx, &mut cmds)?,

        ControlMsg::PlayWord(index) => {
            let block_id = model
                .sequencer
                .block_id
                .clone()
                .ok_or(SyncError::NoBlockLoaded)?;
            // word indices address the whole block, even while a range is loaded
            let (_, full) = resolve_block(ctx.content, &block_id, None)?;
            let word = full.get(index).ok_or(SyncError::UnknownWord(index))?;
            let (start_ms, stop_ms) = (word.begin, word.end);
            play_range(model, &block_id, start_ms, stop_ms, ctx, &mut cmds)?;
        }

        ControlMsg::PlayRange {
            block_id,
            start_ms,
            stop_ms,
        } => play_range(model, &block_id, start_ms, stop_ms, ctx, &mut cmds)?,

        ControlMsg::Pause => {
            cmds.extend(cancel_transition(model));
            if ctx.playback.is_playing {
                cmds.push(Cmd::Transport(TransportCmd::Pause));
            }
        }

        ControlMsg::Resume => {
            if ctx.playback.is_playing {
                return Ok(None);
            }
            let table = model.table.as_ref().ok_or(SyncError::NoBlockLoaded)?;
            let word = locate(table, ctx.playback.position_ms, &mut model.engine.last_resolved);
            cmds.push(Cmd::Emit(SyncEvent::Resume { word: word.clone() }));
            start_playing(model, ctx.now_ms, &mut cmds);
        }

        ControlMsg::ChangeRate(rate) => {
            if !model.sequencer.set_rate(rate) {
                return Ok(None);
            }
            tracing::debug!(rate = model.sequencer.playback_rate, "playback rate changed");
            cmds.extend(cancel_transition(model));
            cmds.push(Cmd::Transport(TransportCmd::SetRate(
                model.sequencer.playback_rate,
            )));
        }

        ControlMsg::SetCurrentTime(position_ms) => {
            if model.table.is_none() {
                return Err(SyncError::NoBlockLoaded);
            }
            cmds.extend(cancel_transition(model));
            cmds.push(Cmd::Transport(TransportCmd::Seek(position_ms.max(0.0))));
        }
    }

    Ok(Cmd::from_vec(cmds))
}

/// Install a resolved block: stop the transport, replace the table, and
/// point the transport at the block's audio
///
/// Returns the playback state as it will be once the emitted commands run.
pub(super) fn install_block(
    model: &mut SyncModel,
    block: &BlockContent,
    table: TimingTable,
    from_ms: Option<f64>,
    is_playing: bool,
    cmds: &mut Vec<Cmd>,
) -> PlaybackState {
    if is_playing {
        cmds.push(Cmd::Transport(TransportCmd::Pause));
    }
    cmds.extend(cancel_transition(model));
    if model.engine.stall_watch.take().is_some() {
        cmds.push(Cmd::CancelTimer(TimerKind::StallCheck));
    }
    retract_all(model, cmds);

    let range_start = table.range().map(|r| r.start_ms as f64);
    let words = table.len();
    model.install(block, table, 0);

    cmds.push(Cmd::Transport(TransportCmd::SetSource(block.audio_ref.clone())));
    cmds.push(Cmd::Transport(TransportCmd::SetRate(
        model.sequencer.playback_rate,
    )));

    let position_ms = from_ms.or(range_start).unwrap_or(0.0).max(0.0);
    if position_ms > 0.0 {
        cmds.push(Cmd::Transport(TransportCmd::Seek(position_ms)));
    }

    let playback = PlaybackState {
        position_ms,
        is_playing: false,
        playback_rate: model.sequencer.playback_rate,
        stop_at_ms: model.sequencer.stop_at_ms,
    };
    select_current_word(model, &playback, cmds);

    tracing::info!(
        block = %block.id,
        words,
        position_ms,
        stop_at_ms = ?model.sequencer.stop_at_ms,
        "block loaded"
    );
    playback
}

/// Load a block and start playing it
#[allow(clippy::too_many_arguments)]
pub(super) fn play_block(
    model: &mut SyncModel,
    block_id: &str,
    from_word: Option<usize>,
    rate: Option<f64>,
    scroll_anchor: Option<i32>,
    ctx: &UpdateContext,
    is_playing: bool,
    cmds: &mut Vec<Cmd>,
) -> Result<(), SyncError> {
    let (block, table) = resolve_block(ctx.content, block_id, None)?;
    let from_ms = match from_word {
        Some(index) => {
            let word = table.get(index).ok_or(SyncError::UnknownWord(index))?;
            Some(word.begin as f64 + model.config.seek_epsilon_ms)
        }
        None => None,
    };

    if let Some(rate) = rate {
        model.sequencer.set_rate(rate);
    }
    install_block(model, &block, table, from_ms, is_playing, cmds);
    if let Some(anchor) = scroll_anchor {
        model.engine.prev_line_offset = anchor;
    }
    start_playing(model, ctx.now_ms, cmds);
    Ok(())
}

/// Load `block_id` restricted to `[start_ms, stop_ms]` and play it once
fn play_range(
    model: &mut SyncModel,
    block_id: &str,
    start_ms: u64,
    stop_ms: u64,
    ctx: &UpdateContext,
    cmds: &mut Vec<Cmd>,
) -> Result<(), SyncError> {
    let range = RangeFilter::new(start_ms, stop_ms);
    let (block, table) = resolve_block(ctx.content, block_id, Some(range))?;
    install_block(
        model,
        &block,
        table,
        Some(start_ms as f64),
        ctx.playback.is_playing,
        cmds,
    );
    start_playing(model, ctx.now_ms, cmds);
    Ok(())
}

/// Jump to a word of the loaded block and play from it
///
/// A range-restricted table is replaced by the whole block first, so the
/// index always names the same word regardless of what was played before.
fn play_from_word(
    model: &mut SyncModel,
    index: usize,
    ctx: &UpdateContext,
    cmds: &mut Vec<Cmd>,
) -> Result<(), SyncError> {
    let table = model.table.as_ref().ok_or(SyncError::NoBlockLoaded)?;
    if table.range().is_some() {
        return leave_range_at_word(model, index, ctx, cmds);
    }
    let word = table.get(index).ok_or(SyncError::UnknownWord(index))?.clone();

    // landing exactly on `begin` can resolve to the previous word
    let position_ms = word.begin as f64 + model.config.seek_epsilon_ms;
    cmds.extend(cancel_transition(model));
    cmds.push(Cmd::Transport(TransportCmd::Seek(position_ms)));
    retract_all(model, cmds);

    let playback = PlaybackState {
        position_ms,
        stop_at_ms: model.sequencer.stop_at_ms,
        ..ctx.playback
    };
    select_current_word(model, &playback, cmds);

    if !ctx.playback.is_playing {
        if index > 0 {
            cmds.push(Cmd::Emit(SyncEvent::Resume { word }));
        }
        start_playing(model, ctx.now_ms, cmds);
    }
    Ok(())
}

/// Reload the whole block of an active range and play from word `index`
fn leave_range_at_word(
    model: &mut SyncModel,
    index: usize,
    ctx: &UpdateContext,
    cmds: &mut Vec<Cmd>,
) -> Result<(), SyncError> {
    let block_id = model
        .sequencer
        .block_id
        .clone()
        .ok_or(SyncError::NoBlockLoaded)?;
    let (block, full) = resolve_block(ctx.content, &block_id, None)?;
    let word = full.get(index).ok_or(SyncError::UnknownWord(index))?.clone();

    let position_ms = word.begin as f64 + model.config.seek_epsilon_ms;
    tracing::debug!(block = %block_id, index, "leaving range playback");
    install_block(
        model,
        &block,
        full,
        Some(position_ms),
        ctx.playback.is_playing,
        cmds,
    );
    if !ctx.playback.is_playing && index > 0 {
        cmds.push(Cmd::Emit(SyncEvent::Resume { word }));
    }
    start_playing(model, ctx.now_ms, cmds);
    Ok(())
}

/// Request playback and start timing the transport's start-up
pub(super) fn start_playing(model: &mut SyncModel, now_ms: u64, cmds: &mut Vec<Cmd>) {
    model.sequencer.request_play(now_ms);
    cmds.push(Cmd::Transport(TransportCmd::Play));
}

/// The last word's window elapsed or the range stop was reached
///
/// Idempotent: a block only completes once until it is played again.
pub(super) fn finalize_block(
    model: &mut SyncModel,
    ctx: &UpdateContext,
    is_playing: bool,
    cmds: &mut Vec<Cmd>,
) {
    if model.engine.phase == Phase::Ended {
        return;
    }

    cmds.extend(cancel_transition(model));
    if model.engine.stall_watch.take().is_some() {
        cmds.push(Cmd::CancelTimer(TimerKind::StallCheck));
    }
    if is_playing {
        cmds.push(Cmd::Transport(TransportCmd::Pause));
    }
    model.engine.phase = Phase::Ended;
    if !model.config.keep_highlight_on_pause {
        retract_all(model, cmds);
    }

    let Some(block_id) = model.sequencer.block_id.clone() else {
        return;
    };
    tracing::info!(block = %block_id, "block complete");
    cmds.push(Cmd::Emit(SyncEvent::Complete {
        block_id: block_id.clone(),
    }));

    if !model.config.auto_continue || model.sequencer.is_range_playback() {
        return;
    }

    match ctx.content.next_block_id(&block_id) {
        Some(next) => {
            tracing::info!(from = %block_id, to = %next, "continuing to next block");
            if let Err(e) = play_block(model, &next, None, None, None, ctx, false, cmds) {
                tracing::warn!(block = %next, "auto-continue failed: {}", e);
            }
        }
        None => tracing::info!(block = %block_id, "last block reached"),
    }
}
