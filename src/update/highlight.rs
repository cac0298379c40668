//! Highlight selection - resolves the current word and emits highlight intents
//!
//! Intents are emitted in the order a DOM-style sink would apply them. Every
//! applied mark is also recorded in the engine state so a later seek or block
//! switch can retract exactly what is showing.

use crate::commands::{Cmd, HighlightIntent, HighlightKind, IntentOp};
use crate::events::SyncEvent;
use crate::model::{locate, EngineState, PlaybackState, SyncModel, TimingTable};
use crate::scheduler::{arm_next, cancel_transition};

/// Emits intents for one table while keeping the mark bookkeeping in step
struct Intents<'a> {
    table: &'a TimingTable,
    engine: &'a mut EngineState,
    cmds: &'a mut Vec<Cmd>,
}

impl Intents<'_> {
    fn push(&mut self, op: IntentOp, kind: HighlightKind, index: usize) {
        let Some(word) = self.table.get(index) else {
            return;
        };
        self.engine
            .record_mark(index, kind, matches!(op, IntentOp::Apply));
        self.cmds.push(Cmd::Highlight(HighlightIntent {
            op,
            kind,
            index,
            element: word.element.clone(),
        }));
    }

    fn apply(&mut self, kind: HighlightKind, index: usize) {
        self.push(IntentOp::Apply, kind, index);
    }

    fn retract(&mut self, kind: HighlightKind, index: usize) {
        self.push(IntentOp::Retract, kind, index);
    }
}

/// Resolve the word at the playback position and bring highlighting in line
///
/// While playing, the word is highlighted and the next transition armed.
/// While paused, any pending transition is cancelled and the highlight is
/// retracted unless the config keeps it.
pub fn select_current_word(model: &mut SyncModel, playback: &PlaybackState, cmds: &mut Vec<Cmd>) {
    let Some(table) = model.table.as_ref() else {
        return;
    };
    let index = locate(table, playback.position_ms, &mut model.engine.last_resolved).index;
    model.engine.current_word = Some(index);

    if playback.is_playing {
        set_word_selection(model, index, cmds);
        cmds.extend(arm_next(model, playback));
    } else {
        cmds.extend(cancel_transition(model));
        if !model.config.keep_highlight_on_pause {
            retract_around(model, index, cmds);
        }
    }
}

/// Highlight `index`, move the trail behind it, and detect line wraps
pub fn set_word_selection(model: &mut SyncModel, index: usize, cmds: &mut Vec<Cmd>) {
    let Some(table) = model.table.as_ref() else {
        return;
    };
    let Some(word) = table.get(index) else {
        return;
    };

    let offset = word.element.offset_top;
    let prev_offset = model.engine.prev_line_offset;
    let is_newline = index > 0 && offset > prev_offset;
    let config = &model.config;

    let mut intents = Intents {
        table,
        engine: &mut model.engine,
        cmds,
    };

    intents.apply(HighlightKind::Current, index);

    if is_newline {
        let percent_complete = table.percent_complete(word);
        tracing::debug!(
            target: "transition",
            word = index,
            prev_offset,
            offset,
            "line break"
        );
        intents.cmds.push(Cmd::Emit(SyncEvent::Newline {
            prev_offset,
            new_offset: offset,
            percent_complete,
        }));
        if config.force_line_scroll {
            intents.cmds.push(Cmd::Scroll {
                delta_px: offset - prev_offset,
                duration_ms: config.scroll_duration_ms,
            });
        }
    }
    intents.engine.prev_line_offset = offset;

    let previous = index.checked_sub(1);
    let stale: Vec<usize> = intents
        .engine
        .applied_marks()
        .into_iter()
        .filter(|&(i, kind)| kind == HighlightKind::Current && i != index && Some(i) != previous)
        .map(|(i, _)| i)
        .collect();
    if let Some(previous) = previous {
        intents.retract(HighlightKind::Current, previous);
    }
    // a jump of more than one word leaves the old current mark behind
    for i in stale {
        intents.retract(HighlightKind::Current, i);
    }

    if is_newline {
        // flush the whole trail left on the previous line
        let floor = index.saturating_sub(config.newline_flush_window);
        for i in (floor..index).rev() {
            intents.retract(HighlightKind::Trail, i);
        }
    } else {
        if config.highlight_trail && index > 0 {
            intents.apply(HighlightKind::Trail, index - 1);
        }
        for back in 2..=config.trail_window + 1 {
            if index >= back {
                intents.retract(HighlightKind::Trail, index - back);
            }
        }
    }
}

/// Retract the current word's mark only
pub fn retract_current(model: &mut SyncModel, index: usize, cmds: &mut Vec<Cmd>) {
    let Some(table) = model.table.as_ref() else {
        return;
    };
    let mut intents = Intents {
        table,
        engine: &mut model.engine,
        cmds,
    };
    intents.retract(HighlightKind::Current, index);
}

/// Retract both marks from `index` and the two words before it
pub fn retract_around(model: &mut SyncModel, index: usize, cmds: &mut Vec<Cmd>) {
    let Some(table) = model.table.as_ref() else {
        return;
    };
    let mut intents = Intents {
        table,
        engine: &mut model.engine,
        cmds,
    };
    for i in (index.saturating_sub(2)..=index).rev() {
        intents.retract(HighlightKind::Current, i);
        intents.retract(HighlightKind::Trail, i);
    }
}

/// Retract every mark currently applied in the active table
pub fn retract_all(model: &mut SyncModel, cmds: &mut Vec<Cmd>) {
    let Some(table) = model.table.as_ref() else {
        return;
    };
    let applied = model.engine.applied_marks();
    let mut intents = Intents {
        table,
        engine: &mut model.engine,
        cmds,
    };
    for (index, kind) in applied {
        intents.retract(kind, index);
    }
}
