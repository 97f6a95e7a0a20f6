//! # abcpool
//!
//! Parse ABC folk-music notation into fixed-capacity, per-voice event
//! timelines.
//!
//! Storage is allocated once, up front: a [`Sheet`] owns one [`Arena`] per
//! voice slot and every parse writes into those arenas without growing them.
//! Events are linked by slot index, so an arena can be copied or serialized
//! as plain data.
//!
//! ```rust
//! use abcpool::{midi_to_frequency, ParserConfig};
//!
//! let mut sheet = ParserConfig::default().build_sheet();
//! sheet.parse("T:Example\nK:D\n|:d2 f a:|")?;
//!
//! let voice = sheet.voice(0).unwrap();
//! assert_eq!(voice.len(), 6);
//! for event in voice {
//!     let hz: Vec<f32> = event.notes().iter().map(|&m| midi_to_frequency(m)).collect();
//!     println!("{} ticks {:?}", event.ticks(), hz);
//! }
//! # Ok::<(), abcpool::AbcError>(())
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod fixed_str;
pub mod key;
pub mod parser;
pub mod pitch;
pub mod report;
pub mod sheet;

pub use arena::{Arena, ArenaFull, Event, EventIndex, EventIter, MAX_CHORD_SIZE};
pub use config::ParserConfig;
pub use error::*;
pub use parser::parse;
pub use pitch::{
    is_rest_midi, midi_note_name, midi_octave, midi_to_frequency, note_to_frequency, note_to_midi,
    Accidental, NoteName,
};
pub use report::TimelineReport;
pub use sheet::{ticks_to_ms, Fraction, Sheet, TICKS_PER_WHOLE};
