//! Mapper configuration: instrument, scoring weights, grouping and technique
//! inference. Built once per run and read-only afterwards.

use crate::tuning::Tuning;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Complete mapper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MapperConfig {
    #[serde(default)]
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub technique: TechniqueConfig,
}

/// The physical instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Named tuning. Default: STANDARD
    #[serde(default)]
    pub tuning: Tuning,

    /// Use only the N highest strings of the tuning. Default: all strings
    #[serde(default)]
    pub num_strings: Option<usize>,

    /// Highest fret on the neck, measured from the nut. Default: 24
    #[serde(default = "InstrumentConfig::default_max_fret")]
    pub max_fret: u8,

    /// Capo fret. Positions are reported relative to it. Default: 0
    #[serde(default)]
    pub capo: u8,
}

impl InstrumentConfig {
    fn default_max_fret() -> u8 {
        24
    }

    /// Open pitches of the strings in use, high to low, without the capo.
    pub fn open_pitches(&self) -> &'static [u8] {
        let all = self.tuning.open_pitches();
        let count = self.string_count().min(all.len());
        &all[..count]
    }

    pub fn string_count(&self) -> usize {
        self.num_strings.unwrap_or_else(|| self.tuning.string_count())
    }

    /// Frets reachable above the capo.
    pub fn playable_frets(&self) -> u8 {
        self.max_fret.saturating_sub(self.capo)
    }
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            num_strings: None,
            max_fret: Self::default_max_fret(),
            capo: 0,
        }
    }
}

/// Weights and switches for the fingering heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "ScoringWeights::default_fret_span_penalty")]
    pub fret_span_penalty: f64,
    #[serde(default = "ScoringWeights::default_movement_penalty")]
    pub movement_penalty: f64,
    #[serde(default = "ScoringWeights::default_string_switch_penalty")]
    pub string_switch_penalty: f64,
    #[serde(default = "ScoringWeights::default_high_fret_penalty")]
    pub high_fret_penalty: f64,
    #[serde(default = "ScoringWeights::default_low_string_high_fret_multiplier")]
    pub low_string_high_fret_multiplier: f64,
    #[serde(default = "ScoringWeights::default_sweet_spot_bonus")]
    pub sweet_spot_bonus: f64,
    #[serde(default)]
    pub sweet_spot_low: u8,
    #[serde(default = "ScoringWeights::default_sweet_spot_high")]
    pub sweet_spot_high: u8,
    /// Fret span above which a shape cannot be held. Default: 4
    #[serde(default = "ScoringWeights::default_unplayable_fret_span")]
    pub unplayable_fret_span: u8,
    /// Leave open strings out of span calculations.
    #[serde(default)]
    pub ignore_open: bool,
    #[serde(default)]
    pub prefer_open: bool,
    #[serde(default = "ScoringWeights::default_fretted_open_penalty")]
    pub fretted_open_penalty: f64,
    #[serde(default)]
    pub barre_bonus: f64,
    #[serde(default)]
    pub barre_penalty: f64,
    #[serde(default)]
    pub let_ring_bonus: f64,
    /// Disqualify shapes that cannot be reached from the previous ones.
    #[serde(default)]
    pub diagonal_span_penalty: bool,
}

impl ScoringWeights {
    fn default_fret_span_penalty() -> f64 {
        100.0
    }

    fn default_movement_penalty() -> f64 {
        3.0
    }

    fn default_string_switch_penalty() -> f64 {
        5.0
    }

    fn default_high_fret_penalty() -> f64 {
        5.0
    }

    fn default_low_string_high_fret_multiplier() -> f64 {
        10.0
    }

    fn default_sweet_spot_bonus() -> f64 {
        0.5
    }

    fn default_sweet_spot_high() -> u8 {
        12
    }

    fn default_unplayable_fret_span() -> u8 {
        4
    }

    fn default_fretted_open_penalty() -> f64 {
        20.0
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            fret_span_penalty: Self::default_fret_span_penalty(),
            movement_penalty: Self::default_movement_penalty(),
            string_switch_penalty: Self::default_string_switch_penalty(),
            high_fret_penalty: Self::default_high_fret_penalty(),
            low_string_high_fret_multiplier: Self::default_low_string_high_fret_multiplier(),
            sweet_spot_bonus: Self::default_sweet_spot_bonus(),
            sweet_spot_low: 0,
            sweet_spot_high: Self::default_sweet_spot_high(),
            unplayable_fret_span: Self::default_unplayable_fret_span(),
            ignore_open: false,
            prefer_open: false,
            fretted_open_penalty: Self::default_fretted_open_penalty(),
            barre_bonus: 0.0,
            barre_penalty: 0.0,
            let_ring_bonus: 0.0,
            diagonal_span_penalty: false,
        }
    }
}

/// How events are gathered into simultaneous groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Grid, in beats, that onsets snap to when forming chords. Default: 0.125
    #[serde(default = "GroupingConfig::default_quantization_resolution")]
    pub quantization_resolution: f64,

    /// Drop repeated pitches within a chord.
    #[serde(default)]
    pub deduplicate_pitches: bool,

    /// Keep only the lowest note of each chord.
    #[serde(default)]
    pub monophonic: bool,

    /// Force every note onto this string, skipping the fingering search.
    #[serde(default)]
    pub single_string: Option<usize>,
}

impl GroupingConfig {
    /// Finest grid accepted, in beats.
    pub const MIN_RESOLUTION: f64 = 0.0125;
    /// Coarsest grid accepted, in beats.
    pub const MAX_RESOLUTION: f64 = 1.0;

    fn default_quantization_resolution() -> f64 {
        0.125
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            quantization_resolution: Self::default_quantization_resolution(),
            deduplicate_pitches: false,
            monophonic: false,
            single_string: None,
        }
    }
}

/// Thresholds for hammer-on, pull-off and tap inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueConfig {
    /// Largest gap, in beats, joined by a hammer-on or pull-off. Default: 0.5
    #[serde(default = "TechniqueConfig::default_legato_time_threshold")]
    pub legato_time_threshold: f64,

    /// Legato runs longer than this are checked for taps. Default: 2
    #[serde(default = "TechniqueConfig::default_tapping_run_threshold")]
    pub tapping_run_threshold: usize,

    /// When false every positioned note is picked.
    #[serde(default = "TechniqueConfig::default_articulations")]
    pub articulations: bool,
}

impl TechniqueConfig {
    fn default_legato_time_threshold() -> f64 {
        0.5
    }

    fn default_tapping_run_threshold() -> usize {
        2
    }

    fn default_articulations() -> bool {
        true
    }
}

impl Default for TechniqueConfig {
    fn default() -> Self {
        Self {
            legato_time_threshold: Self::default_legato_time_threshold(),
            tapping_run_threshold: Self::default_tapping_run_threshold(),
            articulations: Self::default_articulations(),
        }
    }
}

impl MapperConfig {
    pub fn with_tuning(tuning: Tuning) -> Self {
        Self {
            instrument: InstrumentConfig {
                tuning,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Reject settings that would make every later computation meaningless.
    pub fn validate(&self) -> Result<()> {
        let instrument = &self.instrument;

        if instrument.max_fret == 0 {
            return Err(invalid("instrument.max_fret", "must be positive"));
        }
        if instrument.capo >= instrument.max_fret {
            return Err(invalid(
                "instrument.capo",
                format!(
                    "capo {} must be below max_fret {}",
                    instrument.capo, instrument.max_fret
                ),
            ));
        }
        if let Some(count) = instrument.num_strings {
            let available = instrument.tuning.string_count();
            if count == 0 || count > available {
                return Err(invalid(
                    "instrument.num_strings",
                    format!("{} has {} strings, asked for {}", instrument.tuning, available, count),
                ));
            }
        }
        let top = instrument.tuning.highest() as u32 + instrument.max_fret as u32;
        if top > 127 {
            return Err(invalid(
                "instrument.max_fret",
                format!("highest reachable pitch {} exceeds MIDI range", top),
            ));
        }

        let scoring = &self.scoring;
        if scoring.sweet_spot_low > scoring.sweet_spot_high {
            return Err(invalid(
                "scoring.sweet_spot_low",
                "must not exceed sweet_spot_high",
            ));
        }

        let grouping = &self.grouping;
        let resolution = grouping.quantization_resolution;
        if !(GroupingConfig::MIN_RESOLUTION..=GroupingConfig::MAX_RESOLUTION).contains(&resolution) {
            return Err(invalid(
                "grouping.quantization_resolution",
                format!(
                    "{} is outside {} to {} beats",
                    resolution,
                    GroupingConfig::MIN_RESOLUTION,
                    GroupingConfig::MAX_RESOLUTION
                ),
            ));
        }
        if let Some(string) = grouping.single_string {
            if string >= instrument.string_count() {
                return Err(invalid(
                    "grouping.single_string",
                    format!(
                        "string {} does not exist on a {}-string instrument",
                        string,
                        instrument.string_count()
                    ),
                ));
            }
        }

        if !(self.technique.legato_time_threshold >= 0.0) {
            return Err(invalid(
                "technique.legato_time_threshold",
                "must be zero or more beats",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field,
        reason: reason.into(),
    }
}
