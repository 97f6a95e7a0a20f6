//! Key-signature table.
//!
//! Maps a `K:` field value to the accidental applied by default to each
//! letter C..B. Lookup is an exact, case-sensitive linear scan; unknown names
//! fall back to no accidentals (C major / A minor).

use crate::pitch::{Accidental, NoteName};

/// Per-letter accidental pattern, indexed C = 0 .. B = 6.
pub type KeyAccidentals = [Accidental; 7];

/// No sharps or flats.
pub const NO_ACCIDENTALS: KeyAccidentals = [Accidental::None; 7];

// Letter indices in the order sharps and flats are added.
const SHARP_ORDER: [usize; 7] = [3, 0, 4, 1, 5, 2, 6]; // F C G D A E B
const FLAT_ORDER: [usize; 7] = [6, 2, 5, 1, 4, 0, 3]; // B E A D G C F

/// A named key and its accidental pattern.
#[derive(Debug, Clone, Copy)]
pub struct KeySignature {
    pub name: &'static str,
    pub accidentals: KeyAccidentals,
}

/// Build the pattern for a position on the circle of fifths.
/// Positive = sharps, negative = flats.
const fn pattern(fifths: i8) -> KeyAccidentals {
    let mut accidentals = NO_ACCIDENTALS;
    let mut i = 0;
    if fifths > 0 {
        while i < fifths as usize {
            accidentals[SHARP_ORDER[i]] = Accidental::Sharp;
            i += 1;
        }
    } else {
        while i < (-fifths) as usize {
            accidentals[FLAT_ORDER[i]] = Accidental::Flat;
            i += 1;
        }
    }
    accidentals
}

const fn key(name: &'static str, fifths: i8) -> KeySignature {
    KeySignature {
        name,
        accidentals: pattern(fifths),
    }
}

static KEY_SIGNATURES: [KeySignature; 40] = [
    // Major keys
    key("C", 0),
    key("G", 1),
    key("D", 2),
    key("A", 3),
    key("E", 4),
    key("B", 5),
    key("F#", 6),
    key("C#", 7),
    key("F", -1),
    key("Bb", -2),
    key("Eb", -3),
    key("Ab", -4),
    key("Db", -5),
    key("Gb", -6),
    key("Cb", -7),
    key("Cmaj", 0),
    key("Gmaj", 1),
    key("Dmaj", 2),
    key("Fmaj", -1),
    // Minor keys
    key("Am", 0),
    key("Amin", 0),
    key("Em", 1),
    key("Emin", 1),
    key("Bm", 2),
    key("Bmin", 2),
    key("F#m", 3),
    key("F#min", 3),
    key("C#m", 4),
    key("C#min", 4),
    key("G#m", 5),
    key("G#min", 5),
    key("Dm", -1),
    key("Dmin", -1),
    key("Gm", -2),
    key("Gmin", -2),
    key("Cm", -3),
    key("Cmin", -3),
    key("Fm", -4),
    key("Fmin", -4),
    key("Bbm", -5),
];

/// Look up a key by exact name.
pub fn find_key(name: &str) -> Option<&'static KeySignature> {
    KEY_SIGNATURES.iter().find(|k| k.name == name)
}

/// Accidental pattern for a key name; unknown names have no accidentals.
pub fn key_accidentals(name: &str) -> KeyAccidentals {
    find_key(name).map_or(NO_ACCIDENTALS, |k| k.accidentals)
}

/// Default accidental of `note` in a pattern. Rests have none.
pub fn accidental_for(accidentals: &KeyAccidentals, note: NoteName) -> Accidental {
    note.index().map_or(Accidental::None, |i| accidentals[i])
}
