use crate::event::{Fingering, FretPosition};
use crate::scorer::{FingeringHistory, FingeringScorer, Verdict};
use std::collections::BTreeSet;
use tracing::debug;

/// The winning fingering for a slice and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFingering {
    pub fingering: Fingering,
    pub score: f64,
}

/// Pick the best fingering for one simultaneous group.
///
/// `candidates[i]` holds every position that can sound note `i`. The
/// Cartesian product is walked depth-first in candidate order, branches that
/// reuse a string are cut, and the first strictly-highest score wins, so
/// the result is deterministic for a given input.
///
/// Returns `None` when every combination collides on a string or is
/// disqualified by the scorer.
pub fn best_fingering(
    candidates: &[&BTreeSet<FretPosition>],
    history: &FingeringHistory,
    scorer: &dyn FingeringScorer,
) -> Option<ScoredFingering> {
    if candidates.is_empty() || candidates.iter().any(|c| c.is_empty()) {
        return None;
    }

    let mut search = Search {
        candidates,
        history,
        scorer,
        current: Vec::with_capacity(candidates.len()),
        used_strings: BTreeSet::new(),
        best: None,
        considered: 0,
        disqualified: 0,
    };
    search.descend(0);

    debug!(
        considered = search.considered,
        disqualified = search.disqualified,
        best = ?search.best.as_ref().map(|b| b.score),
        "fingering search finished"
    );
    search.best
}

struct Search<'a> {
    candidates: &'a [&'a BTreeSet<FretPosition>],
    history: &'a FingeringHistory,
    scorer: &'a dyn FingeringScorer,
    current: Vec<FretPosition>,
    used_strings: BTreeSet<usize>,
    best: Option<ScoredFingering>,
    considered: usize,
    disqualified: usize,
}

impl Search<'_> {
    fn descend(&mut self, depth: usize) {
        if depth == self.candidates.len() {
            self.evaluate();
            return;
        }

        for &position in self.candidates[depth].iter() {
            if !self.used_strings.insert(position.string) {
                continue;
            }
            self.current.push(position);
            self.descend(depth + 1);
            self.current.pop();
            self.used_strings.remove(&position.string);
        }
    }

    fn evaluate(&mut self) {
        let Some(fingering) = Fingering::new(self.current.clone()) else {
            return;
        };
        self.considered += 1;

        match self.scorer.score(&fingering, self.history) {
            Verdict::Playable { score } => {
                let better = self.best.as_ref().map_or(true, |best| score > best.score);
                if better {
                    self.best = Some(ScoredFingering { fingering, score });
                }
            }
            Verdict::Disqualified { .. } => self.disqualified += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InstrumentConfig, ScoringWeights};
    use crate::geometry::PitchGeometry;
    use crate::scorer::HeuristicScorer;

    fn setup() -> (PitchGeometry, HeuristicScorer) {
        let geometry = PitchGeometry::new(&InstrumentConfig::default()).unwrap();
        let scorer = HeuristicScorer::new(ScoringWeights::default(), &geometry);
        (geometry, scorer)
    }

    fn search(pitches: &[u8], history: &FingeringHistory) -> Option<ScoredFingering> {
        let (geometry, scorer) = setup();
        let candidates: Vec<&BTreeSet<FretPosition>> = pitches
            .iter()
            .map(|p| geometry.candidates(*p).unwrap())
            .collect();
        best_fingering(&candidates, history, &scorer)
    }

    #[test]
    fn single_open_e() {
        let best = search(&[64], &FingeringHistory::new()).unwrap();
        assert_eq!(best.fingering.positions(), &[FretPosition::new(0, 0)]);
    }

    #[test]
    fn unison_pitches_use_different_strings() {
        let best = search(&[64, 64], &FingeringHistory::new()).unwrap();
        let strings = best.fingering.strings();
        assert_eq!(strings.len(), 2);
        assert!(best.fingering.fret_span(false) <= 4);
    }

    #[test]
    fn open_e_major_chord() {
        // E2 B2 E3 G#3 B3 E4
        let best = search(&[40, 47, 52, 56, 59, 64], &FingeringHistory::new()).unwrap();
        assert_eq!(best.fingering.len(), 6);
        assert_eq!(best.fingering.strings().len(), 6);
        assert!(best.fingering.fret_span(false) <= 4);
        assert_eq!(best.fingering.positions()[0], FretPosition::new(5, 0));
    }

    #[test]
    fn seven_notes_cannot_fit_six_strings() {
        assert!(search(&[40, 45, 50, 55, 59, 64, 69], &FingeringHistory::new()).is_none());
    }

    #[test]
    fn unreachable_stretch_yields_none() {
        // E2 only exists as the open low string, E6 only at fret 24 of the high string.
        assert!(search(&[40, 88], &FingeringHistory::new()).is_none());
    }

    #[test]
    fn history_pulls_toward_previous_position() {
        let mut history = FingeringHistory::new();
        history.push(Fingering::new(vec![FretPosition::new(1, 8)]).unwrap());

        // On its own A4 lands on 0:5; after B string fret 8, staying on
        // the B string at fret 10 is cheaper.
        let best = search(&[69], &history).unwrap();
        assert_eq!(best.fingering.positions(), &[FretPosition::new(1, 10)]);
    }

    #[test]
    fn empty_group_has_no_fingering() {
        let (_, scorer) = setup();
        assert!(best_fingering(&[], &FingeringHistory::new(), &scorer).is_none());
    }
}
