//! Note and chord assembly.
//!
//! A single pitch or a bracketed chord becomes one event: every pitch is
//! resolved to a MIDI number, the shared length is scaled by the default note
//! length and any active tuplet, and the result is appended to the active
//! voice's arena.

use super::pitch_token::{parse_length, parse_pitch};
use super::{ParserState, Tuplet};
use crate::arena::{MAX_CHORD_SIZE, MAX_TICKS};
use crate::error::AbcError;
use crate::pitch::REST_MIDI;
use crate::sheet::{Fraction, Sheet, TICKS_PER_WHOLE};

/// Outcome of [`parse_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Assembled {
    Committed,
    /// Parsed, but the active voice has no arena.
    Dropped,
    /// No pitch at the cursor.
    NotANote,
}

/// Pitches collected for one event.
struct ChordBuffer {
    midi: [u8; MAX_CHORD_SIZE],
    size: usize,
}

impl ChordBuffer {
    fn new() -> Self {
        Self {
            midi: [REST_MIDI; MAX_CHORD_SIZE],
            size: 0,
        }
    }

    /// Add a pitch; anything past the size limit is ignored.
    fn push(&mut self, midi: u8) {
        if self.size < MAX_CHORD_SIZE {
            self.midi[self.size] = midi;
            self.size += 1;
        }
    }

    fn notes(&self) -> &[u8] {
        &self.midi[..self.size]
    }
}

pub(super) fn parse_event(state: &mut ParserState, sheet: &mut Sheet) -> Result<Assembled, AbcError> {
    let mut chord = ChordBuffer::new();

    let length = if state.peek() == Some(b'[') {
        // `[1`, `[2` are ending markers, not chords.
        if matches!(state.peek_at(1), Some(b'0'..=b'9')) {
            return Ok(Assembled::NotANote);
        }
        state.pos += 1;
        match parse_chord(state, &mut chord) {
            Some(length) => length,
            None => return Ok(Assembled::NotANote),
        }
    } else {
        match parse_pitch(state) {
            Some(pitch) => {
                chord.push(pitch.midi());
                pitch.length
            }
            None => return Ok(Assembled::NotANote),
        }
    };

    let ticks = event_ticks(length, state.default_length, &state.tuplet);
    if state.tuplet.is_active() {
        state.tuplet.remaining -= 1;
    }

    let Some(slot) = state.active_slot(sheet) else {
        return Ok(Assembled::Dropped);
    };
    let arena = &mut sheet.arenas_mut()[slot];
    match arena.append(ticks, chord.notes()) {
        Ok(_) => Ok(Assembled::Committed),
        Err(_) => {
            log::warn!(
                "Voice {:?} is full after {} events",
                arena.voice_id(),
                arena.len()
            );
            Err(AbcError::PoolExhausted {
                voice: slot,
                capacity: arena.capacity(),
            })
        }
    }
}

/// Read chord members up to `]`, with the cursor just after `[`.
///
/// Returns the shared length: the last member's, replaced by a length written
/// after the closing bracket. `None` if the brackets held no pitch.
fn parse_chord(state: &mut ParserState, chord: &mut ChordBuffer) -> Option<Fraction> {
    let mut length = None;

    while let Some(c) = state.peek() {
        match c {
            b']' => {
                state.pos += 1;
                break;
            }
            b'\n' | b'\r' => break,
            _ => {
                let before = state.pos;
                match parse_pitch(state) {
                    Some(pitch) => {
                        chord.push(pitch.midi());
                        length = Some(pitch.length);
                    }
                    None if state.pos == before => state.pos += 1,
                    None => {}
                }
            }
        }
    }

    let length = length?;
    Some(parse_length(state).unwrap_or(length))
}

/// `TICKS_PER_WHOLE * default * length`, scaled by the tuplet ratio and
/// clamped to [`MAX_TICKS`].
fn event_ticks(length: Fraction, default_length: Fraction, tuplet: &Tuplet) -> u16 {
    let mut num = u128::from(TICKS_PER_WHOLE)
        * u128::from(default_length.num)
        * u128::from(length.num);
    let mut den = u128::from(default_length.den) * u128::from(length.den);
    if tuplet.is_active() {
        num *= u128::from(tuplet.in_time);
        den *= u128::from(tuplet.notes);
    }
    if den == 0 {
        return MAX_TICKS;
    }
    (num / den).min(u128::from(MAX_TICKS)) as u16
}
