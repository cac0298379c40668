//! Input adapter handlers - keyboard and pointer gestures on words
//!
//! Gestures translate into control operations; each is gated by its config
//! switch so an embedding can own the gesture instead.

use crate::commands::Cmd;
use crate::error::SyncError;
use crate::messages::{ControlMsg, InputMsg};
use crate::model::SyncModel;

use super::control::update_control;
use super::UpdateContext;

/// Handle an input gesture
pub fn update_input(
    model: &mut SyncModel,
    msg: InputMsg,
    ctx: &UpdateContext,
) -> Result<Option<Cmd>, SyncError> {
    let control = match msg {
        InputMsg::Spacebar if model.config.spacebar_toggle => {
            if ctx.playback.is_playing {
                ControlMsg::Pause
            } else {
                ControlMsg::Resume
            }
        }
        InputMsg::WordClicked(index) if model.config.click_to_play => {
            ControlMsg::PlayFromWord(index)
        }
        InputMsg::WordEnter(index) => ControlMsg::PlayFromWord(index),
        InputMsg::WordDoubleClicked(index) if model.config.click_to_play => {
            ControlMsg::PlayWord(index)
        }
        _ => {
            tracing::trace!(?msg, "input gesture disabled");
            return Ok(None);
        }
    };

    update_control(model, control, ctx)
}
