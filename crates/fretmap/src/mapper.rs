//! Slice-by-slice orchestration of the fingering search.

use crate::config::MapperConfig;
use crate::event::{FretPosition, MusicalEvent, Song, Track};
use crate::geometry::PitchGeometry;
use crate::grouping::{deduplicate, group_by_onset, keep_lowest, sort_by_time, TimeSlice};
use crate::scorer::{FingeringHistory, FingeringScorer, HeuristicScorer};
use crate::search::best_fingering;
use crate::technique::infer_techniques;
use crate::warning::MappingWarning;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters for one mapping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingStats {
    pub input_notes: usize,
    pub slices: usize,
    pub positioned: usize,
    pub unpositioned: usize,
    /// Repeated pitches dropped from chords.
    pub deduplicated: usize,
    /// Upper chord tones dropped by monophonic reduction.
    pub reduced: usize,
}

/// Output of one mapping pass over a track.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingResult {
    /// Time-sorted copies of the input. Deduplicated and reduced notes are
    /// absent; notes that could not be placed have no string or fret.
    pub events: Vec<MusicalEvent>,
    pub warnings: Vec<MappingWarning>,
    pub stats: MappingStats,
}

impl MappingResult {
    pub fn positioned(&self) -> impl Iterator<Item = &MusicalEvent> {
        self.events.iter().filter(|e| e.is_positioned())
    }

    pub fn unpositioned(&self) -> impl Iterator<Item = &MusicalEvent> {
        self.events.iter().filter(|e| !e.is_positioned())
    }
}

/// Per-track summary from [`FretboardMapper::map_song`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackReport {
    pub track_index: usize,
    pub name: Option<String>,
    pub warnings: Vec<MappingWarning>,
    pub stats: MappingStats,
}

/// Assigns strings, frets and techniques to musical events.
///
/// Holds the immutable pitch geometry and configuration; each mapping pass
/// carries its own fingering history, so one mapper can serve many tracks,
/// including concurrently.
pub struct FretboardMapper {
    config: MapperConfig,
    geometry: PitchGeometry,
    scorer: Arc<dyn FingeringScorer>,
}

impl FretboardMapper {
    /// Validate the configuration and build the mapper with the heuristic scorer.
    pub fn new(config: MapperConfig) -> Result<Self> {
        config.validate()?;
        let geometry = PitchGeometry::new(&config.instrument)?;
        let scorer = Arc::new(HeuristicScorer::new(config.scoring, &geometry));
        Ok(Self::assemble(config, geometry, scorer))
    }

    /// Build with a custom scorer.
    pub fn with_scorer(config: MapperConfig, scorer: Arc<dyn FingeringScorer>) -> Result<Self> {
        config.validate()?;
        let geometry = PitchGeometry::new(&config.instrument)?;
        Ok(Self::assemble(config, geometry, scorer))
    }

    fn assemble(
        config: MapperConfig,
        geometry: PitchGeometry,
        scorer: Arc<dyn FingeringScorer>,
    ) -> Self {
        info!(
            tuning = %config.instrument.tuning,
            strings = geometry.string_count(),
            capo = config.instrument.capo,
            max_fret = config.instrument.max_fret,
            single_string = ?config.grouping.single_string,
            "fretboard mapper ready"
        );
        Self {
            config,
            geometry,
            scorer,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn geometry(&self) -> &PitchGeometry {
        &self.geometry
    }

    /// Map one track's events.
    ///
    /// The input is left untouched; the result holds time-sorted copies
    /// with placements and techniques filled in.
    pub fn map_events(&self, events: &[MusicalEvent]) -> MappingResult {
        let mut sorted: Vec<MusicalEvent> = events.to_vec();
        for event in &mut sorted {
            event.clear_placement();
        }
        sort_by_time(&mut sorted);

        let mut stats = MappingStats {
            input_notes: sorted.len(),
            ..Default::default()
        };
        let mut warnings = Vec::new();

        let mut out = match self.config.grouping.single_string {
            Some(string) => {
                stats.slices = sorted.len();
                self.place_on_string(&mut sorted, string, &mut warnings);
                sorted
            }
            None => self.place_by_slices(sorted, &mut stats, &mut warnings),
        };

        infer_techniques(
            &mut out,
            &self.config.technique,
            self.config.grouping.single_string.is_some(),
        );

        stats.positioned = out.iter().filter(|e| e.is_positioned()).count();
        stats.unpositioned = out.len() - stats.positioned;

        info!(
            notes = stats.input_notes,
            positioned = stats.positioned,
            unpositioned = stats.unpositioned,
            warnings = warnings.len(),
            "mapping pass complete"
        );

        MappingResult {
            events: out,
            warnings,
            stats,
        }
    }

    /// Map every track of a song. Tracks are independent and run in parallel.
    pub fn map_song(&self, song: &Song) -> (Song, Vec<TrackReport>) {
        let results: Vec<MappingResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = song
                .tracks
                .iter()
                .map(|track| scope.spawn(move || self.map_events(&track.events)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut tracks = Vec::with_capacity(results.len());
        let mut reports = Vec::with_capacity(results.len());
        for (track_index, (track, result)) in song.tracks.iter().zip(results).enumerate() {
            reports.push(TrackReport {
                track_index,
                name: track.name.clone(),
                warnings: result.warnings,
                stats: result.stats,
            });
            tracks.push(Track {
                name: track.name.clone(),
                events: result.events,
            });
        }

        (
            Song {
                tracks,
                ..song.clone()
            },
            reports,
        )
    }

    /// Force every note onto one string; notes that do not fit stay unplaced.
    fn place_on_string(
        &self,
        events: &mut [MusicalEvent],
        string: usize,
        warnings: &mut Vec<MappingWarning>,
    ) {
        let Some(open) = self.geometry.open_pitch(string) else {
            return;
        };
        let top = self.geometry.playable_frets() as i16;

        for event in events.iter_mut() {
            let fret = event.pitch as i16 - open as i16;
            if (0..=top).contains(&fret) {
                event.place(FretPosition::new(string, fret as u8));
            } else {
                let warning = MappingWarning::OffString {
                    time: event.time,
                    pitch: event.pitch,
                    string,
                    fret,
                };
                warn!(time = event.time, pitch = event.pitch, string, fret, "{}", warning);
                warnings.push(warning);
            }
        }
    }

    fn place_by_slices(
        &self,
        mut events: Vec<MusicalEvent>,
        stats: &mut MappingStats,
        warnings: &mut Vec<MappingWarning>,
    ) -> Vec<MusicalEvent> {
        let grouping = &self.config.grouping;
        let slices = group_by_onset(&events, grouping.quantization_resolution);
        stats.slices = slices.len();

        let mut dropped: BTreeSet<usize> = BTreeSet::new();
        let mut history = FingeringHistory::new();

        for mut slice in slices {
            if grouping.deduplicate_pitches {
                let removed = deduplicate(&mut slice, &events, |p| self.geometry.normalize_pitch(p));
                stats.deduplicated += removed.len();
                dropped.extend(removed);
            }
            if grouping.monophonic {
                let removed = keep_lowest(&mut slice, &events);
                stats.reduced += removed.len();
                dropped.extend(removed);
            }

            if let Some(warning) = self.place_slice(&slice, &mut events, &mut history) {
                warn!(time = warning.time(), notes = slice.len(), "{}", warning);
                warnings.push(warning);
            }
        }

        if !dropped.is_empty() {
            debug!(count = dropped.len(), "dropped duplicate or reduced chord tones");
        }

        events
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !dropped.contains(idx))
            .map(|(_, event)| event)
            .collect()
    }

    /// Search one slice and write the winner back. Returns a warning when the
    /// slice stays unplaced.
    fn place_slice(
        &self,
        slice: &TimeSlice,
        events: &mut [MusicalEvent],
        history: &mut FingeringHistory,
    ) -> Option<MappingWarning> {
        if slice.is_empty() {
            return None;
        }

        let mut candidates = Vec::with_capacity(slice.len());
        for &idx in &slice.members {
            let pitch = events[idx].pitch;
            match self.geometry.candidates(pitch) {
                Some(positions) => candidates.push(positions),
                None => {
                    return Some(MappingWarning::NoCandidates {
                        time: events[idx].time,
                        pitch,
                    })
                }
            }
        }

        let Some(best) = best_fingering(&candidates, history, self.scorer.as_ref()) else {
            return Some(MappingWarning::UnplayableChord {
                time: events[slice.members[0]].time,
                pitches: slice.members.iter().map(|&idx| events[idx].pitch).collect(),
            });
        };

        debug!(
            onset = slice.onset,
            fingering = %best.fingering,
            score = best.score,
            "slice placed"
        );
        for (&idx, &position) in slice.members.iter().zip(best.fingering.positions()) {
            events[idx].place(position);
        }
        history.push(best.fingering);
        None
    }
}
