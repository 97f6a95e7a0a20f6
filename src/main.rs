use abcpool::report::{ReportEvent, TimelineReport, VoiceReport};
use abcpool::{AbcError, ParserConfig};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

fn main() {
    let result = main_result();
    std::process::exit(match result {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{err}");
            1
        }
    });
}

fn main_result() -> Result<(), AbcError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("abcpool=info"))
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => ParserConfig::load(path)?,
        None => ParserConfig::default(),
    };
    log::debug!("Using {:?}", config);

    let source = read_source(args.input.as_deref())?;

    let mut sheet = config.build_sheet();
    let parsed = sheet.parse(&source);
    if let Err(AbcError::PoolExhausted { voice, capacity }) = &parsed {
        log::warn!(
            "Voice slot {} filled its {} events; the timeline below is truncated",
            voice,
            capacity
        );
    }

    let report = TimelineReport::from_sheet(&sheet, args.limit);
    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| AbcError::Io(e.to_string()))?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    parsed
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CliArgs {
    /// YAML file with `max-voices` and `pool-capacity`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the timeline as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Show at most this many events per voice.
    #[arg(long)]
    limit: Option<usize>,
    /// ABC file to read, `-` or nothing for stdin.
    input: Option<String>,
}

fn read_source(input: Option<&str>) -> Result<String, AbcError> {
    match input {
        None | Some("-") => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
        Some(path) => {
            log::info!("Reading {}", path);
            Ok(fs::read_to_string(path)?)
        }
    }
}

fn print_report(report: &TimelineReport) {
    if !report.title.is_empty() {
        println!("Title:    {}", report.title);
    }
    if !report.composer.is_empty() {
        println!("Composer: {}", report.composer);
    }
    println!(
        "Key: {}  Meter: {}  Length: {}  Tempo: {}={}",
        if report.key.is_empty() { "C" } else { report.key.as_str() },
        report.meter,
        report.default_length,
        report.tempo_base,
        report.tempo_bpm
    );

    for voice in &report.voices {
        println!();
        print_voice(voice);
    }
}

fn print_voice(voice: &VoiceReport) {
    println!(
        "Voice {:?}: {}/{} events, {} ticks, {} ms",
        voice.id, voice.event_count, voice.capacity, voice.total_ticks, voice.duration_ms
    );
    println!("{:>5} {:>8} {:>6}  notes", "#", "start ms", "ticks");
    for event in &voice.events {
        println!(
            "{:>5} {:>8} {:>6}  {}",
            event.index,
            event.start_ms,
            event.ticks,
            describe(event)
        );
    }
    if voice.events.len() < voice.event_count {
        println!("  ... {} more", voice.event_count - voice.events.len());
    }
}

fn describe(event: &ReportEvent) -> String {
    if event.rest {
        return "rest".to_string();
    }
    event
        .names
        .iter()
        .zip(&event.frequencies)
        .map(|(name, hz)| format!("{} ({:.2} Hz)", name, hz))
        .collect::<Vec<_>>()
        .join(" ")
}
