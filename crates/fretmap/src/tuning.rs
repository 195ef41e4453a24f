//! Named tunings for fretted instruments.

use crate::theory::pitch_name;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A named tuning. Open-string pitches run from the highest string to the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tuning {
    #[default]
    Standard,
    EFlat,
    DropD,
    DropC,
    CSharpStandard,
    OpenG,
    OpenC6,
    SevenStringStandard,
    BaritoneB,
    BaritoneA,
    BaritoneC,
    BassStandard,
    BassDropD,
    BassEFlat,
}

impl Tuning {
    pub const ALL: [Tuning; 14] = [
        Tuning::Standard,
        Tuning::EFlat,
        Tuning::DropD,
        Tuning::DropC,
        Tuning::CSharpStandard,
        Tuning::OpenG,
        Tuning::OpenC6,
        Tuning::SevenStringStandard,
        Tuning::BaritoneB,
        Tuning::BaritoneA,
        Tuning::BaritoneC,
        Tuning::BassStandard,
        Tuning::BassDropD,
        Tuning::BassEFlat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tuning::Standard => "STANDARD",
            Tuning::EFlat => "E_FLAT",
            Tuning::DropD => "DROP_D",
            Tuning::DropC => "DROP_C",
            Tuning::CSharpStandard => "C_SHARP_STANDARD",
            Tuning::OpenG => "OPEN_G",
            Tuning::OpenC6 => "OPEN_C6",
            Tuning::SevenStringStandard => "SEVEN_STRING_STANDARD",
            Tuning::BaritoneB => "BARITONE_B",
            Tuning::BaritoneA => "BARITONE_A",
            Tuning::BaritoneC => "BARITONE_C",
            Tuning::BassStandard => "BASS_STANDARD",
            Tuning::BassDropD => "BASS_DROP_D",
            Tuning::BassEFlat => "BASS_E_FLAT",
        }
    }

    /// Open-string MIDI pitches, highest string first.
    pub fn open_pitches(&self) -> &'static [u8] {
        match self {
            Tuning::Standard => &[64, 59, 55, 50, 45, 40],
            Tuning::EFlat => &[63, 58, 54, 49, 44, 39],
            Tuning::DropD => &[64, 59, 55, 50, 45, 38],
            Tuning::DropC => &[62, 57, 53, 48, 43, 36],
            Tuning::CSharpStandard => &[61, 56, 52, 47, 42, 37],
            Tuning::OpenG => &[62, 59, 55, 50, 43, 38],
            Tuning::OpenC6 => &[64, 60, 55, 48, 45, 36],
            Tuning::SevenStringStandard => &[64, 59, 55, 50, 45, 40, 35],
            Tuning::BaritoneB => &[59, 54, 50, 45, 40, 35],
            Tuning::BaritoneA => &[57, 52, 48, 43, 38, 33],
            Tuning::BaritoneC => &[60, 55, 51, 46, 41, 36],
            Tuning::BassStandard => &[43, 38, 33, 28],
            Tuning::BassDropD => &[43, 38, 33, 26],
            Tuning::BassEFlat => &[42, 37, 32, 27],
        }
    }

    pub fn string_count(&self) -> usize {
        self.open_pitches().len()
    }

    pub fn is_bass(&self) -> bool {
        matches!(
            self,
            Tuning::BassStandard | Tuning::BassDropD | Tuning::BassEFlat
        )
    }

    /// Lowest open pitch.
    pub fn lowest(&self) -> u8 {
        self.open_pitches().iter().copied().min().unwrap_or(0)
    }

    /// Highest open pitch.
    pub fn highest(&self) -> u8 {
        self.open_pitches().iter().copied().max().unwrap_or(0)
    }

    /// Open strings as note names, highest first: `["E4", "B3", ...]`.
    pub fn note_names(&self) -> Vec<String> {
        self.open_pitches().iter().map(|p| pitch_name(*p)).collect()
    }
}

impl fmt::Display for Tuning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tuning {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Tuning::ALL
            .iter()
            .copied()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| Error::UnknownTuning(s.to_string()))
    }
}

impl Serialize for Tuning {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Tuning {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_is_high_to_low() {
        assert_eq!(Tuning::Standard.open_pitches(), &[64, 59, 55, 50, 45, 40]);
        assert_eq!(
            Tuning::Standard.note_names(),
            vec!["E4", "B3", "G3", "D3", "A2", "E2"]
        );
    }

    #[test]
    fn every_tuning_descends() {
        for tuning in Tuning::ALL {
            let pitches = tuning.open_pitches();
            assert!(
                pitches.windows(2).all(|w| w[0] > w[1]),
                "{} is not ordered high to low",
                tuning
            );
        }
    }

    #[test]
    fn parse_is_forgiving_about_case_and_dashes() {
        assert_eq!("drop-d".parse::<Tuning>().unwrap(), Tuning::DropD);
        assert_eq!("BASS_STANDARD".parse::<Tuning>().unwrap(), Tuning::BassStandard);
        assert!(matches!(
            "NASHVILLE".parse::<Tuning>(),
            Err(Error::UnknownTuning(name)) if name == "NASHVILLE"
        ));
    }

    #[test]
    fn names_round_trip() {
        for tuning in Tuning::ALL {
            assert_eq!(tuning.name().parse::<Tuning>().unwrap(), tuning);
        }
    }

    #[test]
    fn bass_tunings_have_four_strings() {
        for tuning in Tuning::ALL.iter().filter(|t| t.is_bass()) {
            assert_eq!(tuning.string_count(), 4);
        }
        assert_eq!(Tuning::SevenStringStandard.string_count(), 7);
    }
}
