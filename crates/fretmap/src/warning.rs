//! Advisory diagnostics from a mapping pass.
//!
//! A transcription with a few unpositioned notes beats an aborted one, so
//! per-note and per-chord problems are collected here instead of failing.

use crate::theory::pitch_name;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MappingWarning {
    /// A note's pitch has no position on the instrument.
    NoCandidates { time: f64, pitch: u8 },
    /// No combination of positions for the chord is physically playable.
    UnplayableChord { time: f64, pitches: Vec<u8> },
    /// In single-string mode the note falls off the forced string.
    OffString {
        time: f64,
        pitch: u8,
        string: usize,
        fret: i16,
    },
}

impl MappingWarning {
    /// Onset of the affected notes, in beats.
    pub fn time(&self) -> f64 {
        match self {
            MappingWarning::NoCandidates { time, .. }
            | MappingWarning::UnplayableChord { time, .. }
            | MappingWarning::OffString { time, .. } => *time,
        }
    }

    /// Number of notes left unpositioned by this problem.
    pub fn affected_notes(&self) -> usize {
        match self {
            MappingWarning::UnplayableChord { pitches, .. } => pitches.len(),
            MappingWarning::NoCandidates { .. } | MappingWarning::OffString { .. } => 1,
        }
    }
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::NoCandidates { time, pitch } => write!(
                f,
                "no position for {} at beat {:.3}",
                pitch_name(*pitch),
                time
            ),
            MappingWarning::UnplayableChord { time, pitches } => {
                let names: Vec<String> = pitches.iter().map(|p| pitch_name(*p)).collect();
                write!(
                    f,
                    "no playable fingering for chord [{}] at beat {:.3}",
                    names.join(" "),
                    time
                )
            }
            MappingWarning::OffString {
                time,
                pitch,
                string,
                fret,
            } => write!(
                f,
                "{} at beat {:.3} needs fret {} on forced string {}",
                pitch_name(*pitch),
                time,
                fret,
                string
            ),
        }
    }
}
