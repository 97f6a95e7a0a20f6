//! # Parser Module
//!
//! Single-pass ABC parser writing straight into a [`Sheet`]'s arenas.
//!
//! ## Pipeline
//! 1. `header` consumes the leading `Field:value` lines (up to `K:` or `V:`)
//! 2. the body driver below walks the rest of the input one token at a time,
//!    dispatching to:
//!    - `voice` for `V:` switches
//!    - `repeat` for `|:`, `:|`, `:|:` and `::`
//!    - `chord` for single notes and bracketed chords, which calls
//!      `pitch_token` once per pitch
//!
//! ## Parser State
//! All steps share one [`ParserState`] passed by `&mut`. It lives for one
//! parse only, so the parser is reentrant: two sheets can be parsed on two
//! threads as long as each has its own state and arenas.
//!
//! ## Recovery
//! Only two things stop a parse: missing arguments and a full arena.
//! Unknown characters are skipped one at a time, malformed field values keep
//! the previous setting, and notes for a voice that got no arena are dropped.
//!
//! ## Supported Body Syntax
//! ```text
//! notes      C D E F G A B c d e f g a b, rests z Z
//! accidental ^ ^^ _ __ =   (before the letter)
//! octave     ' ,           (after the letter)
//! length     2  /2  /  //  3/2
//! chord      [CEG]  [CEG]2
//! bars       |  ||  |]  [|
//! repeats    |:  :|  :|:  ::
//! tuplets    (2 .. (9, (p:q:r
//! voices     V:id  [V:id]
//! fields     K: L: M: Q: on their own line or inline as [K:G]
//! skipped    "annotations" !decorations! +decorations+ {grace} ~ . - ( ) < > % comments
//! ```

mod chord;
mod header;
mod pitch_token;
mod repeat;
mod voice;

#[cfg(test)]
mod tests;

use crate::config::DEFAULT_VOICE_ID;
use crate::error::AbcError;
use crate::key::{KeyAccidentals, NO_ACCIDENTALS};
use crate::sheet::{
    Fraction, Sheet, DEFAULT_METER, DEFAULT_NOTE_LENGTH, DEFAULT_TEMPO_BASE, DEFAULT_TEMPO_BPM,
};
use chord::Assembled;
use repeat::RepeatCapture;

/// Active tuplet: the next `remaining` events play `notes` in the time of `in_time`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Tuplet {
    pub notes: u32,
    pub in_time: u32,
    pub remaining: u32,
}

impl Tuplet {
    /// Default "in the time of" for a tuplet of `notes`.
    fn default_in_time(notes: u32) -> u32 {
        match notes {
            2 => 3,
            3 => 2,
            4 => 3,
            6 => 2,
            n => n - 1,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }
}

/// Repeat and tuplet progress of one voice. Parked in the voice's arena while
/// another voice is active.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct VoiceState {
    pub repeat: RepeatCapture,
    pub tuplet: Tuplet,
}

/// Which arena receives the next event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ActiveVoice {
    /// Nothing selected yet; the default voice is created on first use.
    Pending,
    Slot(usize),
    /// The current voice did not fit in the sheet; its events are dropped.
    Dropped,
}

/// Mutable state threaded through every parsing step.
pub(crate) struct ParserState<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    pub default_length: Fraction,
    pub meter: Fraction,
    pub tempo_bpm: u16,
    pub tempo_base: Fraction,
    pub key_accidentals: KeyAccidentals,
    /// Overrides from explicit accidentals, cleared at every bar line.
    pub measure_accidentals: KeyAccidentals,
    pub repeat: RepeatCapture,
    pub tuplet: Tuplet,
    pub voice: ActiveVoice,
}

impl<'a> ParserState<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            default_length: DEFAULT_NOTE_LENGTH,
            meter: DEFAULT_METER,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            tempo_base: DEFAULT_TEMPO_BASE,
            key_accidentals: NO_ACCIDENTALS,
            measure_accidentals: NO_ACCIDENTALS,
            repeat: RepeatCapture::default(),
            tuplet: Tuplet::default(),
            voice: ActiveVoice::Pending,
        }
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Consume `c` if it is next.
    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Move past the current line and its terminator (`\n`, `\r\n` or `\r`).
    fn skip_line(&mut self) {
        while !matches!(self.peek(), None | Some(b'\n' | b'\r')) {
            self.pos += 1;
        }
        if self.eat(b'\r') {
            self.eat(b'\n');
        } else {
            self.eat(b'\n');
        }
    }

    /// Read the rest of the current line (terminator consumed, not returned).
    fn read_line(&mut self) -> &'a str {
        let start = self.pos;
        while !matches!(self.peek(), None | Some(b'\n' | b'\r')) {
            self.pos += 1;
        }
        let line = self.slice(start, self.pos);
        self.skip_line();
        line
    }

    /// Consume a run of decimal digits, saturating on overflow.
    fn read_number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(c @ b'0'..=b'9') = self.peek() {
            let digit = u32::from(c - b'0');
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
            self.pos += 1;
        }
        value
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.input.get(start..end).unwrap_or_default()
    }

    /// True when only blanks precede the cursor on the current line.
    fn at_line_start(&self) -> bool {
        self.bytes[..self.pos]
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n' && b != b'\r')
            .all(|&b| b == b' ' || b == b'\t')
    }

    /// Field letter if the cursor is at `<letter>:` (and not at `D:|` style repeat markup).
    fn field_here(&self) -> Option<u8> {
        let letter = self.peek().filter(u8::is_ascii_alphabetic)?;
        if self.peek_at(1) != Some(b':') {
            return None;
        }
        match self.peek_at(2) {
            Some(b'|' | b':') => None,
            _ => Some(letter),
        }
    }

    /// Slot of the arena receiving events, creating the default voice if needed.
    pub fn active_slot(&mut self, sheet: &mut Sheet) -> Option<usize> {
        match self.voice {
            ActiveVoice::Slot(slot) => Some(slot),
            ActiveVoice::Dropped => None,
            ActiveVoice::Pending => {
                voice::switch_voice(self, sheet, DEFAULT_VOICE_ID);
                self.active_slot(sheet)
            }
        }
    }

    /// Forget every measure-scoped accidental.
    pub fn bar_line(&mut self) {
        self.measure_accidentals = NO_ACCIDENTALS;
    }
}

impl Sheet {
    /// Parse ABC notation into this sheet.
    ///
    /// The sheet is reset first, so results never mix with a previous parse.
    /// On [`AbcError::PoolExhausted`] the events committed so far stay readable.
    ///
    /// # Example
    /// ```
    /// use abcpool::Sheet;
    ///
    /// let mut sheet = Sheet::new(4, 64);
    /// sheet.parse("T:Scale\nL:1/4\nK:G\nG A B c | d e f g |]").unwrap();
    ///
    /// assert_eq!(sheet.title(), "Scale");
    /// let voice = sheet.voice(0).unwrap();
    /// assert_eq!(voice.len(), 8);
    /// // F is sharp in G major.
    /// assert_eq!(voice.iter().nth(6).unwrap().notes(), &[78]);
    /// ```
    pub fn parse(&mut self, source: &str) -> Result<(), AbcError> {
        if self.max_voices() == 0 {
            return Err(AbcError::InvalidArgument("sheet has no arena storage"));
        }
        self.reset();

        let mut state = ParserState::new(source);
        header::parse_header(&mut state, self);
        log::debug!(
            "Header done: L:{} M:{} Q:{}={}",
            state.default_length,
            state.meter,
            state.tempo_base,
            state.tempo_bpm
        );
        parse_body(&mut state, self)
    }
}

/// Parse entry point for callers holding optional handles.
///
/// A missing sheet or missing input is an [`AbcError::InvalidArgument`] and
/// nothing is modified.
pub fn parse(sheet: Option<&mut Sheet>, source: Option<&str>) -> Result<(), AbcError> {
    let sheet = sheet.ok_or(AbcError::InvalidArgument("sheet is missing"))?;
    let source = source.ok_or(AbcError::InvalidArgument("input text is missing"))?;
    sheet.parse(source)
}

/// Body driver: dispatch on the next character until the input is consumed.
fn parse_body(state: &mut ParserState, sheet: &mut Sheet) -> Result<(), AbcError> {
    loop {
        state.skip_whitespace();
        let Some(c) = state.peek() else { break };

        // Field lines and inline voice switches
        if let Some(letter) = state.field_here() {
            if state.at_line_start() {
                state.pos += 2;
                let value = state.read_line();
                apply_body_field(state, sheet, letter, value);
                continue;
            }
            if letter == b'V' {
                state.pos += 2;
                voice::parse_voice_switch(state, sheet);
                continue;
            }
        }

        match c {
            b'[' if state.peek_at(1) == Some(b'|') => {
                state.pos += 2;
                state.active_slot(sheet);
                state.bar_line();
            }
            b'[' if is_inline_field(state) => {
                state.pos += 1;
                parse_inline_field(state, sheet);
            }
            b'|' | b':' => {
                if !repeat::parse_bar(state, sheet)? {
                    state.pos += 1;
                }
            }
            b'(' if matches!(state.peek_at(1), Some(b'2'..=b'9')) => {
                state.pos += 1;
                parse_tuplet(state);
            }
            _ => {
                if skip_decoration(state) {
                    continue;
                }
                let start = state.pos;
                if chord::parse_event(state, sheet)? == Assembled::NotANote {
                    state.pos = start + 1;
                }
            }
        }
    }
    Ok(())
}

/// `(p`, `(p:q` or `(p:q:r` with the cursor just after `(`.
fn parse_tuplet(state: &mut ParserState) {
    let notes = state.read_number().unwrap_or(3).max(2);
    let mut in_time = Tuplet::default_in_time(notes);
    let mut remaining = notes;

    if state.peek() == Some(b':') && matches!(state.peek_at(1), Some(b'0'..=b'9')) {
        state.pos += 1;
        in_time = state.read_number().filter(|&q| q > 0).unwrap_or(in_time);
        if state.peek() == Some(b':') && matches!(state.peek_at(1), Some(b'0'..=b'9')) {
            state.pos += 1;
            remaining = state.read_number().unwrap_or(remaining);
        }
    }

    log::debug!("Tuplet {} in the time of {} for {} notes", notes, in_time, remaining);
    state.tuplet = Tuplet {
        notes,
        in_time,
        remaining,
    };
}

/// Consume a decoration or annotation. Returns false if the cursor is not on one.
fn skip_decoration(state: &mut ParserState) -> bool {
    let Some(c) = state.peek() else { return false };
    match c {
        b'"' => {
            state.pos += 1;
            while let Some(c) = state.advance() {
                if c == b'"' {
                    break;
                }
            }
        }
        b'!' | b'+' => {
            state.pos += 1;
            skip_to_on_line(state, c);
        }
        b'{' => {
            state.pos += 1;
            skip_to_on_line(state, b'}');
        }
        b'%' => state.skip_line(),
        b'(' | b')' | b'-' | b'~' | b'.' | b'<' | b'>' | b'`' | b'&' | b']' => state.pos += 1,
        _ => return false,
    }
    true
}

/// Skip past the next `close` on the current line; stay put if there is none.
fn skip_to_on_line(state: &mut ParserState, close: u8) {
    let rest = &state.bytes[state.pos..];
    let line_end = rest
        .iter()
        .position(|&b| b == b'\n' || b == b'\r')
        .unwrap_or(rest.len());
    if let Some(offset) = rest[..line_end].iter().position(|&b| b == close) {
        state.pos += offset + 1;
    }
}

fn is_inline_field(state: &ParserState) -> bool {
    matches!(state.peek_at(1), Some(b'K' | b'L' | b'M' | b'Q' | b'V'))
        && state.peek_at(2) == Some(b':')
}

/// `[X:value]` with the cursor just after `[`.
fn parse_inline_field(state: &mut ParserState, sheet: &mut Sheet) {
    let letter = state.peek().unwrap_or(b' ');
    state.pos += 2;
    let start = state.pos;
    while !matches!(state.peek(), None | Some(b']' | b'\n' | b'\r')) {
        state.pos += 1;
    }
    let value = state.slice(start, state.pos);
    state.eat(b']');
    apply_body_field(state, sheet, letter, value);
}

/// Apply a field found after the header. Only fields that change how later
/// music is read have an effect here.
fn apply_body_field(state: &mut ParserState, sheet: &mut Sheet, letter: u8, value: &str) {
    match letter {
        b'V' => match voice::first_identifier(value) {
            Some(id) => voice::switch_voice(state, sheet, id),
            None => log::debug!("Ignoring V: field without an identifier"),
        },
        b'K' | b'L' | b'M' | b'Q' => header::apply_field(state, sheet, letter, value),
        _ => log::debug!("Ignoring body field {}:", letter as char),
    }
}
