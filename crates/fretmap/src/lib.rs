//! Fretboard mapping for fretted instruments.
//!
//! Assigns each note of a pitch sequence a string and fret, chosen to be
//! comfortable to play, and labels it with a picking or legato technique.
//!
//! ```
//! use fretmap::{FretPosition, FretboardMapper, MapperConfig, MusicalEvent};
//!
//! let mapper = FretboardMapper::new(MapperConfig::default())?;
//! let result = mapper.map_events(&[MusicalEvent::new(0.0, 64, 1.0, 100)]);
//! assert_eq!(result.events[0].position(), Some(FretPosition::new(0, 0)));
//! # Ok::<(), fretmap::Error>(())
//! ```

pub mod analysis;
pub mod config;
pub mod event;
pub mod geometry;
pub mod grouping;
pub mod mapper;
pub mod prepare;
pub mod scorer;
pub mod search;
pub mod technique;
pub mod theory;
pub mod tuning;
pub mod warning;

pub use analysis::{analyze_range, suggest_tunings, PitchRangeReport, TuningFit};
pub use config::{GroupingConfig, InstrumentConfig, MapperConfig, ScoringWeights, TechniqueConfig};
pub use event::{Fingering, FretPosition, MusicalEvent, Song, Technique, Track};
pub use geometry::PitchGeometry;
pub use mapper::{FretboardMapper, MappingResult, MappingStats, TrackReport};
pub use prepare::{prepare, ConstrainMode, PrepareOptions, PrepareReport};
pub use scorer::{Disqualification, FingeringHistory, FingeringScorer, HeuristicScorer, Verdict};
pub use search::{best_fingering, ScoredFingering};
pub use tuning::Tuning;
pub use warning::MappingWarning;

/// Errors from building a mapper.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown tuning: {0}")]
    UnknownTuning(String),

    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("instrument cannot sound pitch classes {missing:?}")]
    IncompletePitchCoverage { missing: Vec<u8> },
}

pub type Result<T> = std::result::Result<T, Error>;
