//! fretmap - assign strings, frets and techniques to note sequences
//!
//! Subcommands:
//! - `map`: map a JSON song (or bare event array) and write the result
//! - `tunings`: list the named tunings
//! - `analyze`: report a part's pitch range and the tunings that cover it
//! - `config`: show the effective configuration and where it came from

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fretconf::FretConfig;
use fretmap::{ConstrainMode, Tuning};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fretmap")]
#[command(about = "Map note sequences onto a fretted instrument")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./fretmap.toml
    #[arg(long, global = true, env = "FRETMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map notes to string/fret positions and techniques
    Map {
        /// Input JSON song or event array ("-" for stdin)
        input: PathBuf,

        /// Write the mapped song here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace OUTPUT if it already exists
        #[arg(short, long)]
        yes: bool,

        /// Only map this track (0-based)
        #[arg(short, long)]
        track: Option<usize>,

        #[command(flatten)]
        overrides: MapOverrides,
    },

    /// List named tunings
    Tunings {
        /// Show one tuning in detail
        #[arg(long)]
        show: Option<Tuning>,
    },

    /// Report pitch range and tunings that can play it
    Analyze {
        /// Input JSON song or event array ("-" for stdin)
        input: PathBuf,

        /// Only analyze this track (0-based)
        #[arg(short, long)]
        track: Option<usize>,

        /// Highest fret to assume when suggesting tunings
        #[arg(long)]
        max_fret: Option<u8>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ConstrainArg {
    Drop,
    Normalize,
}

impl From<ConstrainArg> for ConstrainMode {
    fn from(arg: ConstrainArg) -> Self {
        match arg {
            ConstrainArg::Drop => ConstrainMode::Drop,
            ConstrainArg::Normalize => ConstrainMode::Normalize,
        }
    }
}

/// Command-line settings layered over the loaded configuration.
#[derive(Args, Debug, Default)]
struct MapOverrides {
    // Instrument
    /// Named tuning (e.g. STANDARD, DROP_D, BASS_STANDARD)
    #[arg(long, help_heading = "Instrument")]
    tuning: Option<Tuning>,
    /// Use only the N highest strings of the tuning
    #[arg(long, help_heading = "Instrument")]
    num_strings: Option<usize>,
    #[arg(long, help_heading = "Instrument")]
    max_fret: Option<u8>,
    #[arg(long, help_heading = "Instrument")]
    capo: Option<u8>,

    // Scoring
    #[arg(long, help_heading = "Scoring")]
    fret_span_penalty: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    movement_penalty: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    string_switch_penalty: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    high_fret_penalty: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    low_string_high_fret_multiplier: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    sweet_spot_bonus: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    sweet_spot_low: Option<u8>,
    #[arg(long, help_heading = "Scoring")]
    sweet_spot_high: Option<u8>,
    /// Chord shapes wider than this many frets are rejected
    #[arg(long, help_heading = "Scoring")]
    unplayable_fret_span: Option<u8>,
    /// Leave open strings out of the fret span
    #[arg(long, help_heading = "Scoring")]
    ignore_open: bool,
    /// Prefer open strings over the same pitch fretted elsewhere
    #[arg(long, help_heading = "Scoring")]
    prefer_open: bool,
    #[arg(long, help_heading = "Scoring")]
    fretted_open_penalty: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    barre_bonus: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    barre_penalty: Option<f64>,
    #[arg(long, help_heading = "Scoring")]
    let_ring_bonus: Option<f64>,
    /// Also reject shapes that stretch too far across consecutive chords
    #[arg(long, help_heading = "Scoring")]
    diagonal_span_penalty: bool,

    // Grouping
    /// Onset grid in beats
    #[arg(long, help_heading = "Grouping")]
    quantization_resolution: Option<f64>,
    /// Drop repeated pitches within a chord
    #[arg(long, help_heading = "Grouping")]
    dedupe: bool,
    /// Keep only the lowest note of each chord
    #[arg(long, help_heading = "Grouping")]
    mono: bool,
    /// Force every note onto this string (0 = highest)
    #[arg(long, help_heading = "Grouping")]
    single_string: Option<usize>,

    // Technique
    /// Longest gap in beats that still counts as legato
    #[arg(long, help_heading = "Technique")]
    legato_time_threshold: Option<f64>,
    #[arg(long, help_heading = "Technique")]
    tapping_run_threshold: Option<usize>,
    /// Mark every note as picked
    #[arg(long, help_heading = "Technique")]
    no_articulations: bool,

    // Prepare
    /// Drop notes quieter than this velocity
    #[arg(long, help_heading = "Prepare")]
    min_velocity: Option<u8>,
    /// Shift every pitch by this many semitones
    #[arg(long, allow_hyphen_values = true, help_heading = "Prepare")]
    transpose: Option<i8>,
    /// Delay every note by N quarter beats
    #[arg(long, help_heading = "Prepare")]
    nudge: Option<u32>,
    /// What to do with notes outside the instrument's range
    #[arg(long, value_enum, help_heading = "Prepare")]
    constrain: Option<ConstrainArg>,
    /// Snap onsets to the grid before mapping
    #[arg(long, help_heading = "Prepare")]
    pre_quantize: bool,
}

impl MapOverrides {
    fn apply(&self, config: &mut FretConfig) {
        let instrument = &mut config.mapper.instrument;
        if let Some(tuning) = self.tuning {
            instrument.tuning = tuning;
        }
        if self.num_strings.is_some() {
            instrument.num_strings = self.num_strings;
        }
        if let Some(v) = self.max_fret {
            instrument.max_fret = v;
        }
        if let Some(v) = self.capo {
            instrument.capo = v;
        }

        let scoring = &mut config.mapper.scoring;
        let weights = [
            (self.fret_span_penalty, &mut scoring.fret_span_penalty),
            (self.movement_penalty, &mut scoring.movement_penalty),
            (self.string_switch_penalty, &mut scoring.string_switch_penalty),
            (self.high_fret_penalty, &mut scoring.high_fret_penalty),
            (
                self.low_string_high_fret_multiplier,
                &mut scoring.low_string_high_fret_multiplier,
            ),
            (self.sweet_spot_bonus, &mut scoring.sweet_spot_bonus),
            (self.fretted_open_penalty, &mut scoring.fretted_open_penalty),
            (self.barre_bonus, &mut scoring.barre_bonus),
            (self.barre_penalty, &mut scoring.barre_penalty),
            (self.let_ring_bonus, &mut scoring.let_ring_bonus),
        ];
        for (value, slot) in weights {
            if let Some(v) = value {
                *slot = v;
            }
        }
        if let Some(v) = self.sweet_spot_low {
            scoring.sweet_spot_low = v;
        }
        if let Some(v) = self.sweet_spot_high {
            scoring.sweet_spot_high = v;
        }
        if let Some(v) = self.unplayable_fret_span {
            scoring.unplayable_fret_span = v;
        }
        scoring.ignore_open |= self.ignore_open;
        scoring.prefer_open |= self.prefer_open;
        scoring.diagonal_span_penalty |= self.diagonal_span_penalty;

        let grouping = &mut config.mapper.grouping;
        if let Some(v) = self.quantization_resolution {
            grouping.quantization_resolution = v;
        }
        grouping.deduplicate_pitches |= self.dedupe;
        grouping.monophonic |= self.mono;
        if self.single_string.is_some() {
            grouping.single_string = self.single_string;
        }

        let technique = &mut config.mapper.technique;
        if let Some(v) = self.legato_time_threshold {
            technique.legato_time_threshold = v;
        }
        if let Some(v) = self.tapping_run_threshold {
            technique.tapping_run_threshold = v;
        }
        if self.no_articulations {
            technique.articulations = false;
        }

        let prepare = &mut config.prepare;
        if let Some(v) = self.min_velocity {
            prepare.min_velocity = v;
        }
        if let Some(v) = self.transpose {
            prepare.transpose = v;
        }
        if let Some(v) = self.nudge {
            prepare.nudge = v;
        }
        if let Some(mode) = self.constrain {
            prepare.constrain = Some(mode.into());
        }
        prepare.pre_quantize |= self.pre_quantize;
    }
}

fn init_tracing(level: &str, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = FretConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging.level, cli.debug);
    tracing::debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    match cli.command {
        Commands::Map {
            input,
            output,
            yes,
            track,
            overrides,
        } => {
            overrides.apply(&mut config);
            commands::map(&config, &input, output.as_deref(), yes, track)?;
        }
        Commands::Tunings { show } => {
            commands::tunings(&config, show);
        }
        Commands::Analyze {
            input,
            track,
            max_fret,
            json,
        } => {
            let max_fret = max_fret.unwrap_or(config.mapper.instrument.max_fret);
            commands::analyze(&input, track, max_fret, json)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_layer_over_config() {
        let cli = Cli::parse_from([
            "fretmap",
            "map",
            "song.json",
            "--tuning",
            "drop_d",
            "--capo",
            "2",
            "--movement-penalty",
            "7.5",
            "--transpose",
            "-12",
            "--constrain",
            "normalize",
            "--mono",
            "--no-articulations",
        ]);
        let Commands::Map { overrides, yes, .. } = cli.command else {
            panic!("expected map command");
        };
        assert!(!yes);

        let mut config = FretConfig::default();
        overrides.apply(&mut config);

        assert_eq!(config.mapper.instrument.tuning, Tuning::DropD);
        assert_eq!(config.mapper.instrument.capo, 2);
        assert_eq!(config.mapper.scoring.movement_penalty, 7.5);
        assert_eq!(config.mapper.scoring.string_switch_penalty, 5.0);
        assert!(config.mapper.grouping.monophonic);
        assert!(!config.mapper.technique.articulations);
        assert_eq!(config.prepare.transpose, -12);
        assert_eq!(config.prepare.constrain, Some(ConstrainMode::Normalize));
    }

    #[test]
    fn yes_flag_parses_short_and_long() {
        for flag in ["-y", "--yes"] {
            let cli = Cli::parse_from(["fretmap", "map", "song.json", "-o", "out.json", flag]);
            let Commands::Map { yes, output, .. } = cli.command else {
                panic!("expected map command");
            };
            assert!(yes);
            assert_eq!(output, Some(PathBuf::from("out.json")));
        }
    }

    #[test]
    fn no_overrides_leave_config_alone() {
        let mut config = FretConfig::default();
        MapOverrides::default().apply(&mut config);
        assert_eq!(config, FretConfig::default());
    }
}
