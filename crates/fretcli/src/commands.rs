//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use fretconf::{ConfigSources, FretConfig};
use fretmap::{
    analyze_range, prepare, suggest_tunings, FretboardMapper, MusicalEvent, Song, Tuning,
};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

const MAX_PITCH: u8 = 127;

/// Accepted input documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Events(Vec<MusicalEvent>),
    Song(Song),
}

fn read_song(input: &Path) -> Result<Song> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };

    let document: InputDocument = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a song or event list", input.display()))?;
    let song = match document {
        InputDocument::Events(events) => Song::from_events(events),
        InputDocument::Song(song) => song,
    };
    check_pitches(&song)?;
    Ok(song)
}

/// MIDI pitches stop at 127; the event type is wider than that.
fn check_pitches(song: &Song) -> Result<()> {
    for (index, track) in song.tracks.iter().enumerate() {
        if let Some(event) = track.events.iter().find(|e| e.pitch > MAX_PITCH) {
            bail!(
                "Track {} has pitch {} at beat {}; pitches must be 0-{}",
                index,
                event.pitch,
                event.time,
                MAX_PITCH
            );
        }
    }
    Ok(())
}

fn select_track(mut song: Song, track: Option<usize>) -> Result<Song> {
    if let Some(index) = track {
        if index >= song.tracks.len() {
            bail!(
                "Track {} requested but the input has {} track(s)",
                index,
                song.tracks.len()
            );
        }
        let chosen = song.tracks.swap_remove(index);
        song.tracks = vec![chosen];
    }
    Ok(song)
}

fn write_output(text: &str, output: Option<&Path>, overwrite: bool) -> Result<()> {
    match output {
        Some(path) => {
            if path.exists() && !overwrite {
                bail!(
                    "{} already exists; pass --yes to overwrite it",
                    path.display()
                );
            }
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}

pub fn map(
    config: &FretConfig,
    input: &Path,
    output: Option<&Path>,
    overwrite: bool,
    track: Option<usize>,
) -> Result<()> {
    let mapper = FretboardMapper::new(config.mapper.clone()).context("Invalid mapper settings")?;
    let mut song = select_track(read_song(input)?, track)?;

    if !config.prepare.is_noop() {
        let resolution = config.mapper.grouping.quantization_resolution;
        for part in &mut song.tracks {
            let (events, report) = prepare(&part.events, &config.prepare, mapper.geometry(), resolution);
            if report.dropped() > 0 || report.normalized > 0 {
                info!(
                    track = ?part.name,
                    quiet = report.quiet,
                    transposed_out = report.transposed_out,
                    out_of_range = report.out_of_range,
                    normalized = report.normalized,
                    "prepared track"
                );
            }
            part.events = events;
        }
    }

    let (mapped, reports) = mapper.map_song(&song);
    for report in &reports {
        info!(
            track = report.track_index,
            name = ?report.name,
            positioned = report.stats.positioned,
            unpositioned = report.stats.unpositioned,
            "track mapped"
        );
        if !report.warnings.is_empty() {
            warn!(
                track = report.track_index,
                count = report.warnings.len(),
                "some notes could not be placed"
            );
        }
    }

    let json = serde_json::to_string_pretty(&mapped)?;
    write_output(&json, output, overwrite)
}

pub fn tunings(config: &FretConfig, show: Option<Tuning>) {
    let max_fret = config.mapper.instrument.max_fret;
    match show {
        Some(tuning) => {
            println!("{}", tuning);
            println!("  strings: {}", tuning.string_count());
            for (string, (pitch, name)) in tuning
                .open_pitches()
                .iter()
                .zip(tuning.note_names())
                .enumerate()
            {
                println!("  {}: {:<3} (MIDI {})", string, name, pitch);
            }
            let top = tuning.highest() as u16 + max_fret as u16;
            println!(
                "  range: {} to {} with {} frets",
                tuning.lowest(),
                top,
                max_fret
            );
        }
        None => {
            for tuning in Tuning::ALL {
                println!("{:<24} {}", tuning.name(), tuning.note_names().join(" "));
            }
        }
    }
}

#[derive(Serialize)]
struct AnalysisOutput {
    range: fretmap::PitchRangeReport,
    suggestions: Vec<fretmap::TuningFit>,
}

pub fn analyze(input: &Path, track: Option<usize>, max_fret: u8, json: bool) -> Result<()> {
    let song = select_track(read_song(input)?, track)?;
    let events: Vec<MusicalEvent> = song
        .tracks
        .into_iter()
        .flat_map(|track| track.events)
        .collect();

    let Some(range) = analyze_range(&events) else {
        bail!("{} contains no notes", input.display());
    };
    let suggestions = suggest_tunings(&range, max_fret);

    if json {
        let out = AnalysisOutput { range, suggestions };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} notes, {} ({}) to {} ({})",
        range.note_count, range.lowest_name, range.min, range.highest_name, range.max
    );
    println!("median {}, spread {:.2} semitones", range.median, range.std_dev);
    if suggestions.is_empty() {
        println!("no named tuning covers this range with {} frets", max_fret);
    } else {
        println!("tunings that fit ({} frets):", max_fret);
        for fit in &suggestions {
            println!(
                "  {:<24} low slack {:>2}, high slack {:>2}",
                fit.tuning.name(),
                fit.low_slack,
                fit.high_slack
            );
        }
    }
    Ok(())
}

pub fn show_config(config: &FretConfig, sources: &ConfigSources) -> Result<()> {
    let text = config
        .to_toml()
        .context("Failed to render the effective configuration")?;
    if sources.files.is_empty() {
        println!("# no config files found, using defaults");
    }
    for file in &sources.files {
        println!("# loaded {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# overridden by ${}", var);
    }
    println!("{}", text);
    Ok(())
}
