//! # Sheet
//!
//! A parsed tune: scalar metadata plus one [`Arena`] per voice slot.
//!
//! ```text
//! Sheet
//!   ├── title / composer / key           (fixed-capacity strings)
//!   ├── tempo_bpm + tempo_base           (Q: field)
//!   ├── default_length                   (L: field)
//!   ├── meter                            (M: field)
//!   ├── voice_count
//!   └── arenas: [Arena; max_voices]      (allocated once by the caller)
//! ```
//!
//! The arenas are created up front and reused across parses. [`Sheet::reset`]
//! clears metadata and every arena without touching their storage.

use crate::arena::Arena;
use crate::fixed_str::FixedStr;
use serde::Serialize;

pub const TITLE_LEN: usize = 64;
pub const COMPOSER_LEN: usize = 64;
pub const KEY_LEN: usize = 16;

/// Tick count of a whole note. An eighth note is 240 ticks.
pub const TICKS_PER_WHOLE: u32 = 1920;

pub const DEFAULT_TEMPO_BPM: u16 = 120;

/// A `num/den` pair as written in `L:`, `M:` and `Q:` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fraction {
    pub num: u32,
    pub den: u32,
}

impl Fraction {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Parse `num/den` with optional surrounding whitespace.
    /// Zero denominators are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let (num, den) = s.trim().split_once('/')?;
        let num = num.trim().parse().ok()?;
        let den = den.trim().parse().ok()?;
        if den == 0 {
            return None;
        }
        Some(Self { num, den })
    }
}

impl std::fmt::Display for Fraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

pub const DEFAULT_NOTE_LENGTH: Fraction = Fraction::new(1, 8);
pub const DEFAULT_METER: Fraction = Fraction::new(4, 4);
pub const DEFAULT_TEMPO_BASE: Fraction = Fraction::new(1, 4);

/// Convert a tick duration to milliseconds at `bpm` beats of `tempo_base` per minute.
///
/// # Example
/// ```
/// use abcpool::{ticks_to_ms, Fraction};
///
/// // A quarter note (480 ticks) at 120 quarter notes per minute.
/// assert_eq!(ticks_to_ms(480, 120, Fraction::new(1, 4)), 500);
/// // The same note when the beat is an eighth note.
/// assert_eq!(ticks_to_ms(480, 120, Fraction::new(1, 8)), 1000);
/// ```
pub fn ticks_to_ms(ticks: u64, bpm: u16, tempo_base: Fraction) -> u64 {
    let beat_ticks = u64::from(TICKS_PER_WHOLE) * u64::from(tempo_base.num);
    let divisor = u64::from(bpm) * beat_ticks;
    if divisor == 0 {
        return 0;
    }
    ticks.saturating_mul(60_000).saturating_mul(u64::from(tempo_base.den)) / divisor
}

/// Parsed tune metadata and per-voice event arenas.
#[derive(Debug, Clone)]
pub struct Sheet {
    arenas: Vec<Arena>,
    pub(crate) title: FixedStr<TITLE_LEN>,
    pub(crate) composer: FixedStr<COMPOSER_LEN>,
    pub(crate) key: FixedStr<KEY_LEN>,
    pub(crate) tempo_bpm: u16,
    pub(crate) tempo_base: Fraction,
    pub(crate) default_length: Fraction,
    pub(crate) meter: Fraction,
    pub(crate) voice_count: usize,
}

impl Sheet {
    /// Create a sheet with `max_voices` arenas of `capacity` events each.
    pub fn new(max_voices: usize, capacity: usize) -> Self {
        Self::with_arenas((0..max_voices).map(|_| Arena::new(capacity)).collect())
    }

    /// Bind a sheet to caller-built arenas, one per voice slot.
    pub fn with_arenas(mut arenas: Vec<Arena>) -> Self {
        arenas.iter_mut().for_each(Arena::reset);
        Self {
            arenas,
            title: FixedStr::new(),
            composer: FixedStr::new(),
            key: FixedStr::new(),
            tempo_bpm: DEFAULT_TEMPO_BPM,
            tempo_base: DEFAULT_TEMPO_BASE,
            default_length: DEFAULT_NOTE_LENGTH,
            meter: DEFAULT_METER,
            voice_count: 0,
        }
    }

    /// Clear metadata and every arena, keeping the arena storage.
    pub fn reset(&mut self) {
        self.arenas.iter_mut().for_each(Arena::reset);
        self.title.clear();
        self.composer.clear();
        self.key.clear();
        self.tempo_bpm = DEFAULT_TEMPO_BPM;
        self.tempo_base = DEFAULT_TEMPO_BASE;
        self.default_length = DEFAULT_NOTE_LENGTH;
        self.meter = DEFAULT_METER;
        self.voice_count = 0;
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn composer(&self) -> &str {
        self.composer.as_str()
    }

    /// Key name as written in the last `K:` field.
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn tempo_bpm(&self) -> u16 {
        self.tempo_bpm
    }

    /// Note value the tempo counts (`1/4` unless `Q:` says otherwise).
    pub fn tempo_base(&self) -> Fraction {
        self.tempo_base
    }

    pub fn default_length(&self) -> Fraction {
        self.default_length
    }

    pub fn meter(&self) -> Fraction {
        self.meter
    }

    /// Number of voices that received an arena.
    pub fn voice_count(&self) -> usize {
        self.voice_count
    }

    /// Number of voice slots (arenas) available.
    pub fn max_voices(&self) -> usize {
        self.arenas.len()
    }

    /// Arena of voice slot `slot`, if that voice exists.
    pub fn voice(&self, slot: usize) -> Option<&Arena> {
        self.arenas[..self.voice_count].get(slot)
    }

    /// Arenas of every voice in order of first appearance.
    pub fn voices(&self) -> &[Arena] {
        &self.arenas[..self.voice_count]
    }

    /// Slot of the voice called `id`.
    pub fn find_voice(&self, id: &str) -> Option<usize> {
        self.voices().iter().position(|a| a.voice_id() == id)
    }

    /// Length of voice `slot` in milliseconds at the sheet's tempo.
    pub fn voice_duration_ms(&self, slot: usize) -> Option<u64> {
        self.voice(slot)
            .map(|a| ticks_to_ms(a.total_ticks(), self.tempo_bpm, self.tempo_base))
    }

    pub(crate) fn arenas_mut(&mut self) -> &mut [Arena] {
        &mut self.arenas
    }
}
