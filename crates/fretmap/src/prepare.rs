//! Event cleanup ahead of mapping.

use crate::event::MusicalEvent;
use crate::geometry::PitchGeometry;
use crate::grouping::quantize_time;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One nudge step, in beats.
pub const NUDGE_UNIT_BEATS: f64 = 0.25;

/// What to do with notes outside the instrument's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstrainMode {
    Drop,
    Normalize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareOptions {
    /// Notes quieter than this are discarded.
    #[serde(default)]
    pub min_velocity: u8,
    /// Semitones added to every pitch.
    #[serde(default)]
    pub transpose: i8,
    /// Shift every onset later by this many quarter beats.
    #[serde(default)]
    pub nudge: u32,
    #[serde(default)]
    pub constrain: Option<ConstrainMode>,
    /// Snap onsets to the grouping grid before mapping.
    #[serde(default)]
    pub pre_quantize: bool,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            min_velocity: 0,
            transpose: 0,
            nudge: 0,
            constrain: None,
            pre_quantize: false,
        }
    }
}

impl PrepareOptions {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Counts of notes removed or changed by [`prepare`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareReport {
    pub quiet: usize,
    pub transposed_out: usize,
    pub out_of_range: usize,
    pub normalized: usize,
}

impl PrepareReport {
    pub fn dropped(&self) -> usize {
        self.quiet + self.transposed_out + self.out_of_range
    }
}

/// Apply `options` to a copy of `events`.
///
/// Steps run in a fixed order: velocity filter, transpose, nudge, range
/// constraint, pre-quantization. `resolution` is the grid used when
/// `pre_quantize` is set.
pub fn prepare(
    events: &[MusicalEvent],
    options: &PrepareOptions,
    geometry: &PitchGeometry,
    resolution: f64,
) -> (Vec<MusicalEvent>, PrepareReport) {
    let mut report = PrepareReport::default();
    let mut out = Vec::with_capacity(events.len());

    for event in events {
        if event.velocity < options.min_velocity {
            report.quiet += 1;
            continue;
        }

        let Some(pitch) = transpose(event.pitch, options.transpose) else {
            report.transposed_out += 1;
            continue;
        };

        let pitch = match options.constrain {
            Some(_) if geometry.contains(pitch) => pitch,
            Some(ConstrainMode::Drop) => {
                report.out_of_range += 1;
                continue;
            }
            Some(ConstrainMode::Normalize) => {
                report.normalized += 1;
                geometry.normalize_pitch(pitch)
            }
            None => pitch,
        };

        let mut time = event.time + options.nudge as f64 * NUDGE_UNIT_BEATS;
        if options.pre_quantize {
            time = quantize_time(time, resolution);
        }

        out.push(MusicalEvent {
            time,
            pitch,
            ..event.clone()
        });
    }

    debug!(
        kept = out.len(),
        dropped = report.dropped(),
        normalized = report.normalized,
        "events prepared"
    );
    (out, report)
}

fn transpose(pitch: u8, semitones: i8) -> Option<u8> {
    let shifted = pitch as i16 + semitones as i16;
    u8::try_from(shifted).ok().filter(|p| *p <= 127)
}
