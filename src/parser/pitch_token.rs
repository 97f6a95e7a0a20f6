//! One written pitch: `[accidentals] letter [octave marks] [length]`.

use super::ParserState;
use crate::key::accidental_for;
use crate::pitch::{self, Accidental, NoteName, MAX_OCTAVE, MIN_OCTAVE};
use crate::sheet::Fraction;

/// A pitch token with its accidental already resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Pitch {
    pub name: NoteName,
    pub octave: i8,
    pub accidental: Accidental,
    /// Length relative to the default note length.
    pub length: Fraction,
}

impl Pitch {
    pub fn midi(&self) -> u8 {
        pitch::note_to_midi(self.name, self.octave, self.accidental)
    }
}

/// Parse one pitch at the cursor.
///
/// Returns `None` when no letter or rest follows the accidental marks; the
/// marks themselves stay consumed.
pub(super) fn parse_pitch(state: &mut ParserState) -> Option<Pitch> {
    let explicit = parse_accidentals(state);

    let (name, mut octave) = NoteName::from_char(char::from(state.peek()?))?;
    state.pos += 1;

    loop {
        match state.peek() {
            Some(b'\'') => octave += 1,
            Some(b',') => octave -= 1,
            _ => break,
        }
        octave = octave.clamp(MIN_OCTAVE, MAX_OCTAVE);
        state.pos += 1;
    }

    let accidental = resolve(state, name, explicit);
    let length = parse_length(state).unwrap_or(Fraction::new(1, 1));

    Some(Pitch {
        name,
        octave,
        accidental,
        length,
    })
}

/// `^` and `_` accumulate up to a double mark; `=` replaces whatever came before.
fn parse_accidentals(state: &mut ParserState) -> Accidental {
    let mut accidental = Accidental::None;
    loop {
        accidental = match state.peek() {
            Some(b'^') => accidental.sharpen(),
            Some(b'_') => accidental.flatten(),
            Some(b'=') => Accidental::Natural,
            _ => return accidental,
        };
        state.pos += 1;
    }
}

/// Apply an explicit mark (recording it for the rest of the measure) or fall
/// back to the measure override and then the key signature.
fn resolve(state: &mut ParserState, name: NoteName, explicit: Accidental) -> Accidental {
    let Some(index) = name.index() else {
        return Accidental::None;
    };
    if !explicit.is_none() {
        state.measure_accidentals[index] = explicit;
        return explicit;
    }
    pitch::resolve_accidental(
        explicit,
        state.measure_accidentals[index],
        accidental_for(&state.key_accidentals, name),
    )
}

/// Length suffix: `n`, `n/m`, `/m`, `n/`, `/`, `//`, ...
///
/// Each bare `/` halves the length. A zero denominator counts as 1.
/// Returns `None` when there is no suffix at the cursor.
pub(super) fn parse_length(state: &mut ParserState) -> Option<Fraction> {
    let num = state.read_number();
    if state.peek() != Some(b'/') {
        return num.map(|n| Fraction::new(n, 1));
    }
    state.pos += 1;

    let den = match state.read_number() {
        Some(den) => den.max(1),
        None => {
            let mut den: u32 = 2;
            while state.eat(b'/') {
                den = den.saturating_mul(2);
            }
            den
        }
    };
    Some(Fraction::new(num.unwrap_or(1), den))
}
