use crate::event::MusicalEvent;
use crate::theory::pitch_name;
use crate::tuning::Tuning;
use serde::{Deserialize, Serialize};

/// Pitch statistics for a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchRangeReport {
    pub min: u8,
    pub max: u8,
    pub median: u8,
    pub std_dev: f64,
    pub note_count: usize,
    pub lowest_name: String,
    pub highest_name: String,
}

/// A tuning able to cover a pitch range, and how much room it leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningFit {
    pub tuning: Tuning,
    /// Semitones between the lowest open string and the lowest note.
    pub low_slack: u8,
    /// Semitones between the highest note and the top of the neck.
    pub high_slack: u8,
}

impl TuningFit {
    pub fn slack(&self) -> u16 {
        self.low_slack as u16 + self.high_slack as u16
    }
}

/// Pitch range of `events`, or `None` when there are none.
pub fn analyze_range(events: &[MusicalEvent]) -> Option<PitchRangeReport> {
    if events.is_empty() {
        return None;
    }

    let mut pitches: Vec<u8> = events.iter().map(|e| e.pitch).collect();
    pitches.sort_unstable();

    let min = pitches[0];
    let max = pitches[pitches.len() - 1];
    let median = pitches[pitches.len() / 2];

    let mean = pitches.iter().map(|&p| p as f64).sum::<f64>() / pitches.len() as f64;
    let variance = pitches
        .iter()
        .map(|&p| {
            let diff = p as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / pitches.len() as f64;

    Some(PitchRangeReport {
        min,
        max,
        median,
        std_dev: variance.sqrt(),
        note_count: pitches.len(),
        lowest_name: pitch_name(min),
        highest_name: pitch_name(max),
    })
}

/// Named tunings whose open strings and `max_fret` reach the whole range,
/// tightest fit first.
pub fn suggest_tunings(report: &PitchRangeReport, max_fret: u8) -> Vec<TuningFit> {
    let mut fits: Vec<TuningFit> = Tuning::ALL
        .iter()
        .filter_map(|&tuning| {
            let top = tuning.highest() as u16 + max_fret as u16;
            if tuning.lowest() > report.min || top < report.max as u16 {
                return None;
            }
            Some(TuningFit {
                tuning,
                low_slack: report.min - tuning.lowest(),
                high_slack: (top - report.max as u16).min(u8::MAX as u16) as u8,
            })
        })
        .collect();

    fits.sort_by_key(|fit| fit.slack());
    fits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_events(pitches: &[u8]) -> Vec<MusicalEvent> {
        pitches
            .iter()
            .enumerate()
            .map(|(i, &p)| MusicalEvent::new(i as f64 * 0.5, p, 0.5, 100))
            .collect()
    }

    #[test]
    fn empty_track_has_no_range() {
        assert!(analyze_range(&[]).is_none());
    }

    #[test]
    fn range_statistics() {
        let report = analyze_range(&make_events(&[64, 40, 52, 52])).unwrap();
        assert_eq!(report.min, 40);
        assert_eq!(report.max, 64);
        assert_eq!(report.median, 52);
        assert_eq!(report.note_count, 4);
        assert_eq!(report.lowest_name, "E2");
        assert_eq!(report.highest_name, "E4");
        assert!((report.std_dev - 72f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn standard_guitar_part_prefers_standard_tuning() {
        let report = analyze_range(&make_events(&[40, 64, 76])).unwrap();
        let fits = suggest_tunings(&report, 24);

        assert_eq!(fits[0].tuning, Tuning::Standard);
        assert_eq!(fits[0].low_slack, 0);
        assert_eq!(fits[0].high_slack, 12);
        assert!(fits.iter().all(|f| f.tuning.lowest() <= 40));
        assert!(!fits.iter().any(|f| f.tuning == Tuning::BassStandard));
    }

    #[test]
    fn low_b_needs_extended_range() {
        let report = analyze_range(&make_events(&[35, 60])).unwrap();
        let tunings: Vec<Tuning> = suggest_tunings(&report, 24)
            .into_iter()
            .map(|f| f.tuning)
            .collect();

        assert!(tunings.contains(&Tuning::SevenStringStandard));
        assert!(tunings.contains(&Tuning::BaritoneB));
        assert!(!tunings.contains(&Tuning::Standard));
        assert!(!tunings.contains(&Tuning::DropC));
    }

    #[test]
    fn bass_line_fits_bass_tunings() {
        let report = analyze_range(&make_events(&[28, 33, 40])).unwrap();
        let fits = suggest_tunings(&report, 20);
        assert_eq!(fits[0].tuning, Tuning::BassStandard);
        assert!(fits.iter().all(|f| f.tuning.is_bass()));
    }
}
