//! # Pitch Tables
//!
//! Pure lookup data for turning a written pitch into a MIDI number and a
//! frequency, and for deriving display information back from a MIDI number.
//!
//! ## Conventions
//! - Octave 4 holds middle C: `C4` is MIDI 60, `A4` is MIDI 69 (440 Hz)
//! - MIDI 0 is reserved for rests
//! - The frequency table covers octaves 0-6 (MIDI 12-95); anything outside is
//!   clamped to the nearest tabulated value
//!
//! Events only store MIDI numbers. Frequency, letter name and octave are
//! derived on demand with the helpers below.

use serde::Serialize;

/// Lowest octave a written pitch can reach.
pub const MIN_OCTAVE: i8 = 0;
/// Highest octave a written pitch can reach.
pub const MAX_OCTAVE: i8 = 6;

/// MIDI number used for rests.
pub const REST_MIDI: u8 = 0;

const LOWEST_TABLE_MIDI: u8 = 12;
const HIGHEST_TABLE_MIDI: u8 = 95;

/// Frequencies in Hz, indexed by `[semitone][octave]` (semitone 0 = C).
const FREQUENCIES: [[f32; 7]; 12] = [
    [16.35, 32.70, 65.41, 130.81, 261.63, 523.25, 1046.50],  // C
    [17.32, 34.65, 69.30, 138.59, 277.18, 554.37, 1108.73],  // C#/Db
    [18.35, 36.71, 73.42, 146.83, 293.66, 587.33, 1174.66],  // D
    [19.45, 38.89, 77.78, 155.56, 311.13, 622.25, 1244.51],  // D#/Eb
    [20.60, 41.20, 82.41, 164.81, 329.63, 659.26, 1318.51],  // E
    [21.83, 43.65, 87.31, 174.61, 349.23, 698.46, 1396.91],  // F
    [23.12, 46.25, 92.50, 185.00, 369.99, 739.99, 1479.98],  // F#/Gb
    [24.50, 49.00, 98.00, 196.00, 392.00, 783.99, 1567.98],  // G
    [25.96, 51.91, 103.83, 207.65, 415.30, 830.61, 1661.22], // G#/Ab
    [27.50, 55.00, 110.00, 220.00, 440.00, 880.00, 1760.00], // A
    [29.14, 58.27, 116.54, 233.08, 466.16, 932.33, 1864.66], // A#/Bb
    [30.87, 61.74, 123.47, 246.94, 493.88, 987.77, 1975.53], // B
];

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Letter class of a written pitch. `Rest` is a letter class of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
    Rest,
}

impl NoteName {
    /// Recognise a pitch letter or rest marker.
    /// Returns the letter class and its default octave (upper case 4, lower case 5).
    pub fn from_char(c: char) -> Option<(NoteName, i8)> {
        let name = match c.to_ascii_uppercase() {
            'C' => NoteName::C,
            'D' => NoteName::D,
            'E' => NoteName::E,
            'F' => NoteName::F,
            'G' => NoteName::G,
            'A' => NoteName::A,
            'B' => NoteName::B,
            'Z' => return Some((NoteName::Rest, 4)),
            _ => return None,
        };
        let octave = if c.is_ascii_lowercase() { 5 } else { 4 };
        Some((name, octave))
    }

    /// Index into the per-letter accidental tables (C = 0 .. B = 6).
    /// `None` for rests.
    pub fn index(self) -> Option<usize> {
        match self {
            NoteName::C => Some(0),
            NoteName::D => Some(1),
            NoteName::E => Some(2),
            NoteName::F => Some(3),
            NoteName::G => Some(4),
            NoteName::A => Some(5),
            NoteName::B => Some(6),
            NoteName::Rest => None,
        }
    }

    /// Semitones above C of the natural letter.
    pub fn semitone(self) -> i16 {
        match self {
            NoteName::C | NoteName::Rest => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::D => "D",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::G => "G",
            NoteName::A => "A",
            NoteName::B => "B",
            NoteName::Rest => "z",
        }
    }
}

/// Accidental state of a pitch.
///
/// `None` means "nothing written / no override". `Natural` is an explicit
/// natural sign, which cancels key-signature and measure alterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Accidental {
    #[default]
    None,
    Sharp,
    Flat,
    DoubleSharp,
    DoubleFlat,
    Natural,
}

impl Accidental {
    /// Semitone alteration this accidental applies.
    pub fn semitones(self) -> i16 {
        match self {
            Accidental::None | Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
            Accidental::DoubleSharp => 2,
            Accidental::DoubleFlat => -2,
        }
    }

    /// Accumulate another `^` mark.
    pub fn sharpen(self) -> Self {
        match self {
            Accidental::Sharp | Accidental::DoubleSharp => Accidental::DoubleSharp,
            _ => Accidental::Sharp,
        }
    }

    /// Accumulate another `_` mark.
    pub fn flatten(self) -> Self {
        match self {
            Accidental::Flat | Accidental::DoubleFlat => Accidental::DoubleFlat,
            _ => Accidental::Flat,
        }
    }

    pub fn is_none(self) -> bool {
        self == Accidental::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Accidental::None => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
            Accidental::DoubleSharp => "##",
            Accidental::DoubleFlat => "bb",
            Accidental::Natural => "=",
        }
    }
}

/// Pick the accidental that applies to one occurrence of a letter.
///
/// An explicit mark wins, then the measure override, then the key signature.
pub fn resolve_accidental(explicit: Accidental, measure: Accidental, key: Accidental) -> Accidental {
    if !explicit.is_none() {
        explicit
    } else if !measure.is_none() {
        measure
    } else {
        key
    }
}

/// MIDI number of a written pitch. Rests map to [`REST_MIDI`].
pub fn note_to_midi(name: NoteName, octave: i8, accidental: Accidental) -> u8 {
    if name == NoteName::Rest {
        return REST_MIDI;
    }
    let octave = octave.clamp(MIN_OCTAVE, MAX_OCTAVE) as i16;
    let midi = 12 + octave * 12 + name.semitone() + accidental.semitones();
    // Octave 0 with a double flat is the lowest case (10), never the rest value.
    midi.clamp(1, 127) as u8
}

/// Frequency in Hz of a written pitch. Rests are 0 Hz.
pub fn note_to_frequency(name: NoteName, octave: i8, accidental: Accidental) -> f32 {
    midi_to_frequency(note_to_midi(name, octave, accidental))
}

/// Frequency in Hz of a MIDI number, clamped to the tabulated range.
pub fn midi_to_frequency(midi: u8) -> f32 {
    if midi == REST_MIDI {
        return 0.0;
    }
    let offset = usize::from(midi.clamp(LOWEST_TABLE_MIDI, HIGHEST_TABLE_MIDI) - LOWEST_TABLE_MIDI);
    FREQUENCIES[offset % 12][offset / 12]
}

/// Sharp-spelled pitch class of a MIDI number, `"z"` for a rest.
pub fn midi_note_name(midi: u8) -> &'static str {
    if midi == REST_MIDI {
        return NoteName::Rest.as_str();
    }
    SHARP_NAMES[usize::from(midi % 12)]
}

/// Octave number of a MIDI number (C4 = 60). `None` for a rest.
pub fn midi_octave(midi: u8) -> Option<i8> {
    if midi == REST_MIDI {
        None
    } else {
        Some((midi / 12) as i8 - 1)
    }
}

pub fn is_rest_midi(midi: u8) -> bool {
    midi == REST_MIDI
}
