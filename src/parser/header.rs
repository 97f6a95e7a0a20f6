//! Header parsing: the `Field:value` lines before the music.
//!
//! The header ends at the first `K:` line (consumed), at a `V:` line (left for
//! the body), or at the first line that is not a field. Malformed values leave
//! the previous setting in place.

use super::ParserState;
use crate::key;
use crate::sheet::{Fraction, Sheet};

pub(super) fn parse_header(state: &mut ParserState, sheet: &mut Sheet) {
    loop {
        state.skip_whitespace();
        if state.at_end() {
            break;
        }
        if state.peek() == Some(b'%') {
            state.skip_line();
            continue;
        }

        let Some(letter) = state.field_here() else { break };
        if letter == b'V' {
            break;
        }

        state.pos += 2;
        let value = state.read_line();
        apply_field(state, sheet, letter, value);

        if letter == b'K' {
            break;
        }
    }
}

/// Apply one field to the parser defaults and the sheet metadata.
pub(super) fn apply_field(state: &mut ParserState, sheet: &mut Sheet, letter: u8, value: &str) {
    let value = strip_comment(value).trim();
    match letter {
        b'T' => sheet.title.set(value),
        b'C' => sheet.composer.set(value),
        b'L' => match Fraction::parse(value) {
            Some(length) => {
                state.default_length = length;
                sheet.default_length = length;
            }
            None => log::debug!("Ignoring malformed L: value {:?}", value),
        },
        b'M' => match parse_meter(value) {
            Some(meter) => {
                state.meter = meter;
                sheet.meter = meter;
            }
            None => log::debug!("Ignoring malformed M: value {:?}", value),
        },
        b'Q' => match parse_tempo(value) {
            Some((base, bpm)) => {
                if let Some(base) = base {
                    state.tempo_base = base;
                    sheet.tempo_base = base;
                }
                state.tempo_bpm = bpm;
                sheet.tempo_bpm = bpm;
            }
            None => log::debug!("Ignoring malformed Q: value {:?}", value),
        },
        b'K' => {
            sheet.key.set(value);
            state.key_accidentals = match key::find_key(value) {
                Some(k) => k.accidentals,
                // "K:G clef=bass" and the like: look up the leading token.
                None => key::key_accidentals(value.split_whitespace().next().unwrap_or("")),
            };
            log::debug!("Key {:?} -> {:?}", value, state.key_accidentals);
        }
        b'X' => {}
        _ => log::debug!("Ignoring header field {}:", letter as char),
    }
}

fn strip_comment(value: &str) -> &str {
    value.split_once('%').map_or(value, |(before, _)| before)
}

/// `num/den`, or the symbols `C` (4/4) and `C|` (2/2).
fn parse_meter(value: &str) -> Option<Fraction> {
    match value {
        "C" => Some(Fraction::new(4, 4)),
        "C|" => Some(Fraction::new(2, 2)),
        _ => Fraction::parse(value),
    }
}

/// `[base=]bpm`. Returns the optional tempo base and the beats per minute.
fn parse_tempo(value: &str) -> Option<(Option<Fraction>, u16)> {
    let (base, bpm) = match value.split_once('=') {
        Some((base, bpm)) => (Some(Fraction::parse(base)?), bpm),
        None => (None, value),
    };
    let bpm = bpm.trim();
    let digits = bpm.find(|c: char| !c.is_ascii_digit()).unwrap_or(bpm.len());
    let bpm: u16 = bpm[..digits].parse().ok()?;
    if bpm == 0 {
        return None;
    }
    Some((base, bpm))
}
