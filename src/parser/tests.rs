use super::parse;
use crate::error::AbcError;
use crate::pitch::midi_to_frequency;
use crate::sheet::{Fraction, Sheet};

fn parse_sheet(source: &str) -> Sheet {
    let mut sheet = Sheet::new(4, 64);
    let result = sheet.parse(source);
    assert!(result.is_ok(), "parse failed: {:?}", result);
    sheet
}

/// Pitches of every event of voice `slot`.
fn notes(sheet: &Sheet, slot: usize) -> Vec<Vec<u8>> {
    sheet
        .voice(slot)
        .unwrap()
        .iter()
        .map(|e| e.notes().to_vec())
        .collect()
}

/// First pitch of every event of voice `slot`.
fn melody(sheet: &Sheet, slot: usize) -> Vec<u8> {
    notes(sheet, slot).iter().map(|n| n[0]).collect()
}

fn ticks(sheet: &Sheet, slot: usize) -> Vec<u16> {
    sheet.voice(slot).unwrap().iter().map(|e| e.ticks()).collect()
}

// ============================================================================
// Pitch
// ============================================================================

#[test]
fn test_middle_c_and_a440() {
    let sheet = parse_sheet("K:C\nC A");
    assert_eq!(melody(&sheet, 0), vec![60, 69]);

    let a = sheet.voice(0).unwrap().iter().nth(1).unwrap();
    let hz = a.frequencies().next().unwrap();
    assert!((hz - 440.0).abs() < 1.0, "A4 should be 440 Hz, got {}", hz);
}

#[test]
fn test_natural_scale() {
    let sheet = parse_sheet("K:C\nC D E F G A B c");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 64, 65, 67, 69, 71, 72]);
}

#[test]
fn test_octave_marks() {
    // c'' would be octave 7 and is clamped to 6.
    let sheet = parse_sheet("c c' c'' C, C,,,");
    assert_eq!(melody(&sheet, 0), vec![72, 84, 84, 48, 24]);
}

#[test]
fn test_stacked_accidentals() {
    let sheet = parse_sheet("^^C | __D | =C | ^^^C");
    assert_eq!(melody(&sheet, 0), vec![62, 60, 60, 62]);
}

#[test]
fn test_rests() {
    let sheet = parse_sheet("z Z2 ^z");
    let voice = sheet.voice(0).unwrap();
    assert!(voice.iter().all(|e| e.is_rest()));
    assert_eq!(ticks(&sheet, 0), vec![240, 480, 240]);
    assert_eq!(midi_to_frequency(0), 0.0);
}

// ============================================================================
// Accidentals
// ============================================================================

#[test]
fn test_accidental_persists_within_measure() {
    let sheet = parse_sheet("K:C\n^F F F");
    assert_eq!(melody(&sheet, 0), vec![66, 66, 66]);
}

#[test]
fn test_accidental_reverts_after_bar() {
    let sheet = parse_sheet("K:C\n^F | F");
    assert_eq!(melody(&sheet, 0), vec![66, 65]);
}

#[test]
fn test_key_signature_applies() {
    let sheet = parse_sheet("K:G\nG A B c d e f g");
    assert_eq!(melody(&sheet, 0), vec![67, 69, 71, 72, 74, 76, 78, 79]);
}

#[test]
fn test_natural_cancels_key_until_bar() {
    let sheet = parse_sheet("K:D\nc =c c | c");
    assert_eq!(melody(&sheet, 0), vec![73, 72, 72, 73]);
}

#[test]
fn test_flat_key() {
    let sheet = parse_sheet("K:Bb\nB E F");
    assert_eq!(melody(&sheet, 0), vec![70, 63, 65]);
}

#[test]
fn test_accidental_is_per_letter() {
    // ^F alters F only, in every octave of that letter.
    let sheet = parse_sheet("K:C\n^F G f");
    assert_eq!(melody(&sheet, 0), vec![66, 67, 78]);
}

#[test]
fn test_every_bar_form_resets_accidentals() {
    let sheet = parse_sheet("^F || F ^F |] F ^F [| F ^F |: F ^F :| F");
    let m = melody(&sheet, 0);
    assert_eq!(&m[..8], &[66, 65, 66, 65, 66, 65, 66, 65]);
}

// ============================================================================
// Chords
// ============================================================================

#[test]
fn test_chord_is_one_event() {
    let sheet = parse_sheet("K:C\n[CEG]");
    let voice = sheet.voice(0).unwrap();
    assert_eq!(voice.len(), 1);
    let chord = voice.first().unwrap();
    assert_eq!(chord.chord_size(), 3);
    assert_eq!(chord.notes(), &[60, 64, 67]);
}

#[test]
fn test_chord_length() {
    // Trailing length applies to the chord, otherwise the last member's wins.
    let sheet = parse_sheet("[CE]2 [C2E4] [CE]");
    assert_eq!(ticks(&sheet, 0), vec![480, 960, 240]);
}

#[test]
fn test_chord_accidentals_enter_measure() {
    let sheet = parse_sheet("[^CE] C | C");
    assert_eq!(notes(&sheet, 0), vec![vec![61, 64], vec![61], vec![60]]);
}

#[test]
fn test_chord_truncated_to_limit() {
    let sheet = parse_sheet("[CDEFGABc] d");
    let voice = sheet.voice(0).unwrap();
    assert_eq!(voice.first().unwrap().notes(), &[60, 62, 64, 65, 67, 69]);
    assert_eq!(melody(&sheet, 0), vec![60, 74]);
}

// ============================================================================
// Durations and tuplets
// ============================================================================

#[test]
fn test_duration_arithmetic() {
    let sheet = parse_sheet("L:1/8\nK:C\nC C2 C/2 C/ C// C3/2");
    assert_eq!(ticks(&sheet, 0), vec![240, 480, 120, 120, 60, 360]);
}

#[test]
fn test_zero_denominator_counts_as_one() {
    let sheet = parse_sheet("C/0 C3/0");
    assert_eq!(ticks(&sheet, 0), vec![240, 720]);
}

#[test]
fn test_huge_length_clamps() {
    let sheet = parse_sheet("L:1/1\nC99999");
    assert_eq!(ticks(&sheet, 0), vec![u16::MAX]);
}

#[test]
fn test_triplet() {
    let sheet = parse_sheet("(3CDE F");
    assert_eq!(ticks(&sheet, 0), vec![160, 160, 160, 240]);
}

#[test]
fn test_duplet() {
    let sheet = parse_sheet("(2CD E");
    assert_eq!(ticks(&sheet, 0), vec![360, 360, 240]);
}

#[test]
fn test_tuplet_with_explicit_ratio_and_count() {
    let sheet = parse_sheet("(3:2:2 C D E");
    assert_eq!(ticks(&sheet, 0), vec![160, 160, 240]);
}

#[test]
fn test_tuplet_counts_chords_once() {
    let sheet = parse_sheet("(3[CE]DE F");
    assert_eq!(ticks(&sheet, 0), vec![160, 160, 160, 240]);
}

#[test]
fn test_slurs_are_not_tuplets() {
    let sheet = parse_sheet("C-C (DE)");
    assert_eq!(melody(&sheet, 0), vec![60, 60, 62, 64]);
    assert_eq!(ticks(&sheet, 0), vec![240; 4]);
}

// ============================================================================
// Repeats
// ============================================================================

#[test]
fn test_simple_repeat() {
    let sheet = parse_sheet("|:C D:|");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 60, 62]);
}

#[test]
fn test_repeat_after_prefix() {
    let sheet = parse_sheet("A B |:C D:|");
    assert_eq!(melody(&sheet, 0), vec![69, 71, 60, 62, 60, 62]);
}

#[test]
fn test_music_after_repeat() {
    let sheet = parse_sheet("|:C D:| E F");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 60, 62, 64, 65]);
}

#[test]
fn test_repeat_without_start_marker() {
    let sheet = parse_sheet("C D :| E");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 60, 62, 64]);
}

#[test]
fn test_end_start_repeat() {
    let sheet = parse_sheet("|:C:|:D:|");
    assert_eq!(melody(&sheet, 0), vec![60, 60, 62, 62]);
}

#[test]
fn test_double_colon_is_end_start() {
    let sheet = parse_sheet("|:C::D:|");
    assert_eq!(melody(&sheet, 0), vec![60, 60, 62, 62]);
}

#[test]
fn test_second_plain_end_repeats_only_new_music() {
    let sheet = parse_sheet("C :| D :|");
    assert_eq!(melody(&sheet, 0), vec![60, 60, 62, 62]);
}

#[test]
fn test_repeat_copies_resolved_pitches() {
    let sheet = parse_sheet("|:^F F:| F");
    assert_eq!(melody(&sheet, 0), vec![66, 66, 66, 66, 65]);
}

#[test]
fn test_repeat_copies_chords_and_lengths() {
    let sheet = parse_sheet("|:[CEG]2 (3DEF:|");
    let voice = sheet.voice(0).unwrap();
    assert_eq!(voice.len(), 8);
    assert_eq!(ticks(&sheet, 0), vec![480, 160, 160, 160, 480, 160, 160, 160]);
    assert_eq!(voice.iter().nth(4).unwrap().notes(), &[60, 64, 67]);
    assert_eq!(voice.total_ticks(), 1920);
}

#[test]
fn test_note_d_before_repeat_end() {
    // `D:|` is a note followed by a repeat, not a field.
    let sheet = parse_sheet("|:D:|");
    assert_eq!(melody(&sheet, 0), vec![62, 62]);
}

#[test]
fn test_empty_repeat_is_harmless() {
    let sheet = parse_sheet("C |::| D");
    assert_eq!(melody(&sheet, 0), vec![60, 62]);
}

// ============================================================================
// Voices
// ============================================================================

#[test]
fn test_voices_are_idempotent() {
    let sheet = parse_sheet("V:A\nC D\nV:B\nE\nV:A\nF");
    assert_eq!(sheet.voice_count(), 2);
    assert_eq!(sheet.voice(0).unwrap().voice_id(), "A");
    assert_eq!(sheet.voice(1).unwrap().voice_id(), "B");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 65]);
    assert_eq!(melody(&sheet, 1), vec![64]);
}

#[test]
fn test_inline_voice_switch() {
    let sheet = parse_sheet("K:C\nC D V:two E F V:default G");
    assert_eq!(sheet.voice_count(), 2);
    assert_eq!(sheet.find_voice("default"), Some(0));
    assert_eq!(sheet.find_voice("two"), Some(1));
    assert_eq!(melody(&sheet, 0), vec![60, 62, 67]);
    assert_eq!(melody(&sheet, 1), vec![64, 65]);
}

#[test]
fn test_bracketed_voice_field() {
    let sheet = parse_sheet("K:C\n[V:S] C [V:A] E [V:S] D");
    assert_eq!(melody(&sheet, 0), vec![60, 62]);
    assert_eq!(melody(&sheet, 1), vec![64]);
}

#[test]
fn test_voice_line_properties_are_ignored() {
    let sheet = parse_sheet("V:T1 clef=treble name=\"Tenor\"\nC\nV:T1\nD");
    assert_eq!(sheet.voice_count(), 1);
    assert_eq!(melody(&sheet, 0), vec![60, 62]);
}

#[test]
fn test_default_voice_created_lazily() {
    let sheet = parse_sheet("T:Empty\nK:C\n");
    assert_eq!(sheet.voice_count(), 0);

    let sheet = parse_sheet("T:Bars\nK:C\n| |");
    assert_eq!(sheet.voice_count(), 1);
    assert_eq!(sheet.voice(0).unwrap().voice_id(), "default");
    assert!(sheet.voice(0).unwrap().is_empty());
}

#[test]
fn test_extra_voices_are_dropped() {
    let mut sheet = Sheet::new(1, 8);
    sheet.parse("V:A\nC\nV:B\nD D D\nV:A\nE").unwrap();
    assert_eq!(sheet.voice_count(), 1);
    assert_eq!(melody(&sheet, 0), vec![60, 64]);
    assert!(sheet.find_voice("B").is_none());
}

#[test]
fn test_repeat_does_not_span_voices() {
    let sheet = parse_sheet("V:A\nC D\nV:B\nE :|");
    assert_eq!(melody(&sheet, 0), vec![60, 62]);
    assert_eq!(melody(&sheet, 1), vec![64, 64]);
}

#[test]
fn test_repeats_resume_in_interleaved_voices() {
    let sheet = parse_sheet("V:1\n|:C D|\nV:2\n|:E F|\nV:1\nG A:|\nV:2\nB c:|");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 67, 69, 60, 62, 67, 69]);
    assert_eq!(melody(&sheet, 1), vec![64, 65, 71, 72, 64, 65, 71, 72]);
}

#[test]
fn test_end_start_repeat_resumes_after_voice_switch() {
    let sheet = parse_sheet("V:1\n|:C:|:D\nV:2\nE\nV:1\nF:|");
    assert_eq!(melody(&sheet, 0), vec![60, 60, 62, 65, 62, 65]);
    assert_eq!(melody(&sheet, 1), vec![64]);
}

#[test]
fn test_tuplet_is_per_voice() {
    let sheet = parse_sheet("K:C\n(3C V:B D E V:default F G A");
    assert_eq!(ticks(&sheet, 0), vec![160, 160, 160, 240]);
    assert_eq!(ticks(&sheet, 1), vec![240, 240]);
}

#[test]
fn test_voice_state_cleared_between_parses() {
    let mut sheet = Sheet::new(2, 16);
    sheet.parse("V:A\n|:C (3D\nV:B\nE").unwrap();
    sheet.parse("V:A\nF\nV:B\nG\nV:A\nA :|").unwrap();
    assert_eq!(melody(&sheet, 0), vec![65, 69, 65, 69]);
    assert_eq!(ticks(&sheet, 0), vec![240; 4]);
}

// ============================================================================
// Header and fields
// ============================================================================

#[test]
fn test_header_fields() {
    let sheet = parse_sheet(
        "X:1\nT:Title\nC:Composer\nL:1/4\nM:6/8\nQ:3/8=80\nK:Am\nA",
    );
    assert_eq!(sheet.title(), "Title");
    assert_eq!(sheet.composer(), "Composer");
    assert_eq!(sheet.key(), "Am");
    assert_eq!(sheet.default_length(), Fraction::new(1, 4));
    assert_eq!(sheet.meter(), Fraction::new(6, 8));
    assert_eq!(sheet.tempo_base(), Fraction::new(3, 8));
    assert_eq!(sheet.tempo_bpm(), 80);
    assert_eq!(ticks(&sheet, 0), vec![480]);
}

#[test]
fn test_malformed_fields_keep_defaults() {
    let sheet = parse_sheet("L:abc\nM:3/0\nQ:0\nK:C\nC");
    assert_eq!(sheet.default_length(), Fraction::new(1, 8));
    assert_eq!(sheet.meter(), Fraction::new(4, 4));
    assert_eq!(sheet.tempo_bpm(), 120);
    assert_eq!(ticks(&sheet, 0), vec![240]);
}

#[test]
fn test_common_time_symbols() {
    assert_eq!(parse_sheet("M:C\nK:C\n").meter(), Fraction::new(4, 4));
    assert_eq!(parse_sheet("M:C|\nK:C\n").meter(), Fraction::new(2, 2));
}

#[test]
fn test_long_title_is_truncated() {
    let title = "x".repeat(200);
    let sheet = parse_sheet(&format!("T:{}\nK:C\n", title));
    assert_eq!(sheet.title().len(), crate::sheet::TITLE_LEN);
}

#[test]
fn test_key_with_clef_uses_first_token() {
    let sheet = parse_sheet("K:G clef=bass\nF");
    assert_eq!(sheet.key(), "G clef=bass");
    assert_eq!(melody(&sheet, 0), vec![66]);
}

#[test]
fn test_unknown_key_has_no_accidentals() {
    let sheet = parse_sheet("K:Hmaj\nF B");
    assert_eq!(melody(&sheet, 0), vec![65, 71]);
}

#[test]
fn test_header_ends_at_body_line() {
    let sheet = parse_sheet("T:X\nC D\nK:G\nF");
    assert_eq!(sheet.key(), "G");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 66]);
}

#[test]
fn test_line_endings() {
    let sheet = parse_sheet("T:Crlf\r\nK:C\r\nC\rD\nE");
    assert_eq!(sheet.title(), "Crlf");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 64]);
}

#[test]
fn test_comments() {
    let sheet = parse_sheet("T:Tune % hi\n% whole line\nK:C % key\nC % D E\nF");
    assert_eq!(sheet.title(), "Tune");
    assert_eq!(sheet.key(), "C");
    assert_eq!(melody(&sheet, 0), vec![60, 65]);
}

#[test]
fn test_body_field_lines() {
    let sheet = parse_sheet("K:C\nF\nK:G\nF\nL:1/4\nC\nw:ignored lyrics\nD");
    assert_eq!(sheet.key(), "G");
    assert_eq!(sheet.default_length(), Fraction::new(1, 4));
    assert_eq!(melody(&sheet, 0), vec![65, 66, 60, 62]);
    assert_eq!(ticks(&sheet, 0), vec![240, 240, 480, 480]);
}

#[test]
fn test_inline_fields() {
    let sheet = parse_sheet("K:C\nF [K:G] F [L:1/4] C [M:3/4] [Q:90] D");
    assert_eq!(melody(&sheet, 0), vec![65, 66, 60, 62]);
    assert_eq!(ticks(&sheet, 0), vec![240, 240, 480, 480]);
    assert_eq!(sheet.meter(), Fraction::new(3, 4));
    assert_eq!(sheet.tempo_bpm(), 90);
}

// ============================================================================
// Skipped input
// ============================================================================

#[test]
fn test_decorations_are_skipped() {
    let sheet = parse_sheet("\"Am\"C !trill!D +fermata+E ~F .G {ab}A");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 64, 65, 67, 69]);
}

#[test]
fn test_unknown_characters_are_skipped() {
    let sheet = parse_sheet("C @ # $ D 1 ^ E");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 64]);
}

#[test]
fn test_endings_are_skipped() {
    let sheet = parse_sheet("|:C [1 D :|2 E |]");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 60, 62, 64]);
}

#[test]
fn test_unclosed_decoration_skips_only_the_mark() {
    let sheet = parse_sheet("!C D\nE");
    assert_eq!(melody(&sheet, 0), vec![60, 62, 64]);
}

// ============================================================================
// Errors and lifecycle
// ============================================================================

#[test]
fn test_pool_exhaustion() {
    let mut sheet = Sheet::new(1, 3);
    let result = sheet.parse("C D E F G");
    assert_eq!(
        result,
        Err(AbcError::PoolExhausted {
            voice: 0,
            capacity: 3
        })
    );

    let voice = sheet.voice(0).unwrap();
    assert_eq!(voice.len(), 3);
    assert_eq!(voice.iter().count(), 3);
    assert_eq!(voice.tail_index(), Some(2));
    assert_eq!(melody(&sheet, 0), vec![60, 62, 64]);
}

#[test]
fn test_pool_exhaustion_during_replay() {
    let mut sheet = Sheet::new(1, 3);
    let result = sheet.parse("|:C D:|");
    assert!(matches!(result, Err(AbcError::PoolExhausted { .. })));
    assert_eq!(sheet.voice(0).unwrap().len(), 3);
    assert_eq!(melody(&sheet, 0), vec![60, 62, 60]);
}

#[test]
fn test_reparse_does_not_leak() {
    let mut sheet = Sheet::new(2, 16);
    sheet.parse("T:One\nQ:200\nK:D\nV:A\nC D E F\nV:B\nG").unwrap();
    assert_eq!(sheet.voice_count(), 2);

    sheet.parse("T:Two\nE").unwrap();
    assert_eq!(sheet.title(), "Two");
    assert_eq!(sheet.key(), "");
    assert_eq!(sheet.tempo_bpm(), 120);
    assert_eq!(sheet.voice_count(), 1);
    assert_eq!(sheet.voice(0).unwrap().voice_id(), "default");
    assert_eq!(melody(&sheet, 0), vec![64]);
    assert_eq!(sheet.voice(0).unwrap().total_ticks(), 240);
    assert!(sheet.voice(1).is_none());
}

#[test]
fn test_missing_arguments() {
    let mut sheet = Sheet::new(1, 8);
    sheet.parse("C D").unwrap();

    assert!(matches!(
        parse(None, Some("C")),
        Err(AbcError::InvalidArgument(_))
    ));
    assert!(matches!(
        parse(Some(&mut sheet), None),
        Err(AbcError::InvalidArgument(_))
    ));
    // Nothing was touched.
    assert_eq!(melody(&sheet, 0), vec![60, 62]);

    assert!(parse(Some(&mut sheet), Some("E")).is_ok());
    assert_eq!(melody(&sheet, 0), vec![64]);
}

#[test]
fn test_sheet_without_arenas() {
    let mut sheet = Sheet::new(0, 8);
    assert!(matches!(
        sheet.parse("C"),
        Err(AbcError::InvalidArgument(_))
    ));
}

#[test]
fn test_duration_in_ms() {
    let sheet = parse_sheet("L:1/4\nQ:1/4=60\nK:C\nC D");
    assert_eq!(sheet.voice(0).unwrap().total_ticks(), 960);
    assert_eq!(sheet.voice_duration_ms(0), Some(2000));
    assert_eq!(sheet.voice_duration_ms(1), None);
}
