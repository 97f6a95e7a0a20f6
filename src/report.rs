//! Timeline report
//!
//! Flattens a parsed [`Sheet`] into plain, serializable data for the demo
//! binary's JSON and table output. Each event carries its start and length in
//! ticks and milliseconds plus the pitches in MIDI, name and Hz form.

use crate::arena::Arena;
use crate::pitch::{midi_note_name, midi_octave, midi_to_frequency};
use crate::sheet::{ticks_to_ms, Fraction, Sheet};
use serde::Serialize;

/// One event on a voice timeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEvent {
    pub index: usize,
    pub start_ticks: u64,
    pub ticks: u16,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub midi_notes: Vec<u8>,
    pub names: Vec<String>,
    pub frequencies: Vec<f32>,
    pub rest: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceReport {
    pub id: String,
    pub event_count: usize,
    pub capacity: usize,
    pub total_ticks: u64,
    pub duration_ms: u64,
    pub events: Vec<ReportEvent>,
}

/// Metadata and voices of a parsed sheet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineReport {
    pub title: String,
    pub composer: String,
    pub key: String,
    pub tempo_bpm: u16,
    pub tempo_base: Fraction,
    pub meter: Fraction,
    pub default_length: Fraction,
    pub voices: Vec<VoiceReport>,
}

impl TimelineReport {
    /// Build a report, listing at most `limit` events per voice.
    pub fn from_sheet(sheet: &Sheet, limit: Option<usize>) -> Self {
        let voices = sheet
            .voices()
            .iter()
            .map(|arena| voice_report(sheet, arena, limit))
            .collect();

        Self {
            title: sheet.title().to_string(),
            composer: sheet.composer().to_string(),
            key: sheet.key().to_string(),
            tempo_bpm: sheet.tempo_bpm(),
            tempo_base: sheet.tempo_base(),
            meter: sheet.meter(),
            default_length: sheet.default_length(),
            voices,
        }
    }
}

/// Display name of a MIDI number: `C4`, `F#5`, `z` for a rest.
pub fn pitch_label(midi: u8) -> String {
    match midi_octave(midi) {
        Some(octave) => format!("{}{}", midi_note_name(midi), octave),
        None => midi_note_name(midi).to_string(),
    }
}

fn voice_report(sheet: &Sheet, arena: &Arena, limit: Option<usize>) -> VoiceReport {
    let to_ms = |ticks: u64| ticks_to_ms(ticks, sheet.tempo_bpm(), sheet.tempo_base());

    let mut start_ticks = 0u64;
    let events = arena
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, event)| {
            let start = start_ticks;
            start_ticks += u64::from(event.ticks());
            ReportEvent {
                index,
                start_ticks: start,
                ticks: event.ticks(),
                start_ms: to_ms(start),
                duration_ms: to_ms(u64::from(event.ticks())),
                midi_notes: event.notes().to_vec(),
                names: event.notes().iter().map(|&m| pitch_label(m)).collect(),
                frequencies: event.notes().iter().map(|&m| midi_to_frequency(m)).collect(),
                rest: event.is_rest(),
            }
        })
        .collect();

    VoiceReport {
        id: arena.voice_id().to_string(),
        event_count: arena.len(),
        capacity: arena.capacity(),
        total_ticks: arena.total_ticks(),
        duration_ms: to_ms(arena.total_ticks()),
        events,
    }
}
