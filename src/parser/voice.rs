//! Voice registry: one arena per voice identifier.

use super::{ActiveVoice, ParserState, VoiceState};
use crate::arena::VOICE_ID_LEN;
use crate::fixed_str::FixedStr;
use crate::sheet::Sheet;

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Slot of voice `id`, binding the next free arena on first sight.
/// `None` when every arena is already taken by another voice.
pub(super) fn register_voice(sheet: &mut Sheet, id: &str) -> Option<usize> {
    // Compare against the id as it would be stored.
    let id = FixedStr::<VOICE_ID_LEN>::from_str_truncated(id);
    if let Some(slot) = sheet.find_voice(id.as_str()) {
        return Some(slot);
    }
    if sheet.voice_count >= sheet.max_voices() {
        return None;
    }

    let slot = sheet.voice_count;
    sheet.arenas_mut()[slot].bind_voice(id.as_str());
    sheet.voice_count += 1;
    log::debug!("Voice {:?} bound to slot {}", id.as_str(), slot);
    Some(slot)
}

/// Make `id` the active voice.
///
/// The repeat capture and tuplet of the voice being left are parked in its
/// arena, and those of `id` are picked up where that voice left them.
pub(super) fn switch_voice(state: &mut ParserState, sheet: &mut Sheet, id: &str) {
    if let ActiveVoice::Slot(current) = state.voice {
        sheet.arenas_mut()[current].saved = VoiceState {
            repeat: state.repeat,
            tuplet: state.tuplet,
        };
    }

    let resumed = match register_voice(sheet, id) {
        Some(slot) => {
            state.voice = ActiveVoice::Slot(slot);
            sheet.arenas_mut()[slot].saved
        }
        None => {
            log::warn!(
                "No arena left for voice {:?} ({} voices max), dropping its notes",
                id,
                sheet.max_voices()
            );
            state.voice = ActiveVoice::Dropped;
            VoiceState::default()
        }
    };
    state.repeat = resumed.repeat;
    state.tuplet = resumed.tuplet;
}

/// Inline `V:id` with the cursor just after the colon.
pub(super) fn parse_voice_switch(state: &mut ParserState, sheet: &mut Sheet) {
    state.skip_blanks();
    let start = state.pos;
    while state.peek().is_some_and(is_identifier_byte) {
        state.pos += 1;
    }
    let id = state.slice(start, state.pos);
    if id.is_empty() {
        log::debug!("Ignoring V: without an identifier");
        return;
    }
    switch_voice(state, sheet, id);
}

/// Leading identifier of a `V:` field value (`"T1 clef=treble"` gives `"T1"`).
pub(super) fn first_identifier(value: &str) -> Option<&str> {
    let value = value.trim_start();
    let end = value
        .bytes()
        .position(|b| !is_identifier_byte(b))
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}
