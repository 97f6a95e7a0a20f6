//! Bar lines and repeat unrolling.
//!
//! ```text
//! |  ||  |]        bar line
//! |:               bar line, start capturing
//! :|  :||          bar line, replay the capture
//! :|:  ::          bar line, replay the capture and start a new one
//! ```
//!
//! Replays append copies of already resolved events, so the accidental state
//! at the time of the replay has no effect on them.

use super::ParserState;
use crate::arena::{Arena, ArenaFull, EventIndex};
use crate::error::AbcError;
use crate::sheet::Sheet;

/// Event range captured since the last repeat start, in arena slot indices.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RepeatCapture {
    pub start: usize,
    /// Last slot replayed by the most recent `:|`.
    pub end: Option<usize>,
    /// Inside an explicit `|:` section.
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Marker {
    Bar,
    Start,
    End,
    EndStart,
}

/// Handle a bar or repeat marker at the cursor.
///
/// Returns `Ok(false)` without consuming anything when the cursor holds a
/// lone `:` that is not part of a marker.
pub(super) fn parse_bar(state: &mut ParserState, sheet: &mut Sheet) -> Result<bool, AbcError> {
    let Some(marker) = read_marker(state) else {
        return Ok(false);
    };

    let slot = state.active_slot(sheet);
    state.bar_line();

    let Some(slot) = slot else {
        return Ok(true);
    };
    let arena = &mut sheet.arenas_mut()[slot];

    match marker {
        Marker::Bar => {}
        Marker::Start => {
            if state.repeat.active {
                log::debug!(
                    "Repeat opened at slot {} was never closed",
                    state.repeat.start
                );
            }
            state.repeat.start = arena.len();
            state.repeat.active = true;
        }
        Marker::End | Marker::EndStart => {
            replay(&mut state.repeat, arena).map_err(|ArenaFull| {
                log::warn!(
                    "Voice {:?} filled up while replaying a repeat",
                    arena.voice_id()
                );
                AbcError::PoolExhausted {
                    voice: slot,
                    capacity: arena.capacity(),
                }
            })?;
            if let Some(end) = state.repeat.end {
                log::debug!(
                    "Replayed slots {}..={} of voice {:?}",
                    state.repeat.start,
                    end,
                    arena.voice_id()
                );
            }
            state.repeat.start = arena.len();
            state.repeat.active = marker == Marker::EndStart;
        }
    }
    Ok(true)
}

fn read_marker(state: &mut ParserState) -> Option<Marker> {
    let start = state.pos;

    if state.peek() == Some(b'|') {
        while state.eat(b'|') {}
        if state.eat(b']') {
            return Some(Marker::Bar);
        }
        if state.peek() == Some(b':') {
            while state.eat(b':') {}
            return Some(Marker::Start);
        }
        return Some(Marker::Bar);
    }

    let mut colons = 0;
    while state.eat(b':') {
        colons += 1;
    }
    if state.peek() == Some(b'|') {
        while state.eat(b'|') {}
        state.eat(b']');
        if state.peek() == Some(b':') {
            while state.eat(b':') {}
            return Some(Marker::EndStart);
        }
        return Some(Marker::End);
    }
    if colons >= 2 {
        return Some(Marker::EndStart);
    }

    state.pos = start;
    None
}

/// Append copies of slots `start..=len-1` to the end of the arena.
fn replay(capture: &mut RepeatCapture, arena: &mut Arena) -> Result<(), ArenaFull> {
    if arena.len() <= capture.start {
        log::debug!("Empty repeat section at slot {}", capture.start);
        capture.end = None;
        return Ok(());
    }
    let end = arena.len() - 1;
    capture.end = Some(end);

    for index in capture.start..=end {
        let Some(event) = arena.get(index as EventIndex).copied() else {
            break;
        };
        arena.append_copy(&event)?;
    }
    Ok(())
}
