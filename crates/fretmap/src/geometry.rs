use crate::config::InstrumentConfig;
use crate::event::FretPosition;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Every pitch the instrument can sound, with all the positions that sound it.
///
/// Built once from an [`InstrumentConfig`] and never mutated, so a single
/// geometry can be shared by any number of mapping passes.
#[derive(Debug, Clone)]
pub struct PitchGeometry {
    /// Capo-adjusted open pitches, highest string first.
    open_pitches: Vec<u8>,
    playable_frets: u8,
    index: BTreeMap<u8, BTreeSet<FretPosition>>,
    min_pitch: u8,
    max_pitch: u8,
}

impl PitchGeometry {
    pub fn new(instrument: &InstrumentConfig) -> Result<Self> {
        let open_pitches: Vec<u8> = instrument
            .open_pitches()
            .iter()
            .map(|p| p.saturating_add(instrument.capo))
            .collect();
        let playable_frets = instrument.playable_frets();

        let mut index: BTreeMap<u8, BTreeSet<FretPosition>> = BTreeMap::new();
        for (string, &open) in open_pitches.iter().enumerate() {
            for fret in 0..=playable_frets {
                let Some(pitch) = open.checked_add(fret).filter(|p| *p <= 127) else {
                    break;
                };
                index
                    .entry(pitch)
                    .or_default()
                    .insert(FretPosition::new(string, fret));
            }
        }

        let (Some(&min_pitch), Some(&max_pitch)) = (index.keys().next(), index.keys().next_back())
        else {
            return Err(Error::InvalidConfig {
                field: "instrument",
                reason: "instrument has no playable positions".to_string(),
            });
        };

        let covered: BTreeSet<u8> = index.keys().map(|p| p % 12).collect();
        let missing: Vec<u8> = (0..12).filter(|pc| !covered.contains(pc)).collect();
        if !missing.is_empty() {
            return Err(Error::IncompletePitchCoverage { missing });
        }

        Ok(Self {
            open_pitches,
            playable_frets,
            index,
            min_pitch,
            max_pitch,
        })
    }

    /// Positions that sound exactly `pitch`, in (string, fret) order.
    pub fn positions(&self, pitch: u8) -> Option<&BTreeSet<FretPosition>> {
        self.index.get(&pitch)
    }

    /// Positions for `pitch` after folding it into the playable range.
    pub fn candidates(&self, pitch: u8) -> Option<&BTreeSet<FretPosition>> {
        self.positions(self.normalize_pitch(pitch))
    }

    /// Shift `pitch` by whole octaves until it lies within the playable range.
    ///
    /// Pitches already in range are returned unchanged. Out-of-range notes
    /// change octave rather than being dropped.
    pub fn normalize_pitch(&self, pitch: u8) -> u8 {
        let mut pitch = pitch as i16;
        while pitch > self.max_pitch as i16 {
            pitch -= 12;
        }
        while pitch < self.min_pitch as i16 {
            pitch += 12;
        }
        pitch as u8
    }

    /// The pitch a position sounds.
    pub fn pitch_at(&self, position: FretPosition) -> Option<u8> {
        if position.fret > self.playable_frets {
            return None;
        }
        self.open_pitches
            .get(position.string)
            .map(|open| open + position.fret)
    }

    /// Capo-adjusted open pitch of a string.
    pub fn open_pitch(&self, string: usize) -> Option<u8> {
        self.open_pitches.get(string).copied()
    }

    pub fn open_pitches(&self) -> &[u8] {
        &self.open_pitches
    }

    pub fn is_open_pitch(&self, pitch: u8) -> bool {
        self.open_pitches.contains(&pitch)
    }

    pub fn string_count(&self) -> usize {
        self.open_pitches.len()
    }

    pub fn playable_frets(&self) -> u8 {
        self.playable_frets
    }

    /// Lowest and highest reachable pitches.
    pub fn range(&self) -> (u8, u8) {
        (self.min_pitch, self.max_pitch)
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.index.contains_key(&pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn standard() -> PitchGeometry {
        PitchGeometry::new(&InstrumentConfig::default()).unwrap()
    }

    #[test]
    fn standard_range_is_e2_to_e6() {
        assert_eq!(standard().range(), (40, 88));
    }

    #[test]
    fn high_e_has_every_string() {
        let geometry = standard();
        let positions: Vec<FretPosition> = geometry.positions(64).unwrap().iter().copied().collect();
        assert_eq!(
            positions,
            vec![
                FretPosition::new(0, 0),
                FretPosition::new(1, 5),
                FretPosition::new(2, 9),
                FretPosition::new(3, 14),
                FretPosition::new(4, 19),
                FretPosition::new(5, 24),
            ]
        );
    }

    #[test]
    fn capo_shifts_pitch_and_shrinks_neck() {
        let instrument = InstrumentConfig {
            capo: 2,
            ..Default::default()
        };
        let geometry = PitchGeometry::new(&instrument).unwrap();
        assert_eq!(geometry.range(), (42, 88));
        assert_eq!(geometry.open_pitch(0), Some(66));
        assert_eq!(geometry.pitch_at(FretPosition::new(0, 0)), Some(66));
        assert_eq!(geometry.playable_frets(), 22);
        assert!(geometry
            .positions(66)
            .unwrap()
            .contains(&FretPosition::new(0, 0)));
    }

    #[test]
    fn normalize_folds_by_octaves() {
        let geometry = standard();
        assert_eq!(geometry.normalize_pitch(28), 40);
        assert_eq!(geometry.normalize_pitch(100), 88);
        assert_eq!(geometry.normalize_pitch(101), 89 - 12);
        assert_eq!(geometry.normalize_pitch(60), 60);
    }

    #[test]
    fn normalize_preserves_pitch_class_for_all_midi() {
        let geometry = standard();
        let (low, high) = geometry.range();
        for pitch in 0..=127u8 {
            let normalized = geometry.normalize_pitch(pitch);
            assert_eq!(normalized % 12, pitch % 12, "pitch {}", pitch);
            assert!(normalized >= low && normalized <= high, "pitch {}", pitch);
            assert!(geometry.candidates(pitch).is_some(), "pitch {}", pitch);
        }
    }

    #[test]
    fn pitch_at_matches_index() {
        let geometry = standard();
        for (pitch, positions) in &geometry.index {
            for position in positions {
                assert_eq!(geometry.pitch_at(*position), Some(*pitch));
            }
        }
        assert_eq!(geometry.pitch_at(FretPosition::new(0, 25)), None);
        assert_eq!(geometry.pitch_at(FretPosition::new(6, 0)), None);
    }

    #[test]
    fn short_neck_missing_pitch_classes_fails() {
        let instrument = InstrumentConfig {
            tuning: Tuning::Standard,
            num_strings: Some(1),
            max_fret: 5,
            capo: 0,
        };
        match PitchGeometry::new(&instrument) {
            Err(Error::IncompletePitchCoverage { missing }) => assert_eq!(missing.len(), 6),
            other => panic!("expected coverage error, got {:?}", other),
        }
    }
}
