//! Fingering desirability heuristics.

use crate::config::ScoringWeights;
use crate::event::{fret_span, Fingering};
use crate::geometry::PitchGeometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of scoring one candidate fingering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Verdict {
    /// Higher is better.
    Playable { score: f64 },
    /// The hand cannot form this shape at all.
    Disqualified { reason: Disqualification },
}

impl Verdict {
    pub fn score(&self) -> Option<f64> {
        match self {
            Verdict::Playable { score } => Some(*score),
            Verdict::Disqualified { .. } => None,
        }
    }

    pub fn is_playable(&self) -> bool {
        matches!(self, Verdict::Playable { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Disqualification {
    /// The chord alone stretches past the playable span.
    FretSpan { span: u8 },
    /// The chord cannot be reached from the preceding ones.
    DiagonalSpan { span: u8 },
}

/// Fingerings chosen for the most recent slices, newest first.
///
/// Depth is fixed at two: the previous fingering drives transition costs and
/// the one before it extends the diagonal-span check when let-ring is active.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingeringHistory {
    previous: Option<Fingering>,
    before_previous: Option<Fingering>,
}

impl FingeringHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&Fingering> {
        self.previous.as_ref()
    }

    pub fn before_previous(&self) -> Option<&Fingering> {
        self.before_previous.as_ref()
    }

    pub fn push(&mut self, fingering: Fingering) {
        self.before_previous = self.previous.replace(fingering);
    }

    pub fn clear(&mut self) {
        self.previous = None;
        self.before_previous = None;
    }
}

/// Scores candidate fingerings for one slice.
///
/// Implementations must be pure: the same candidate and history always give
/// the same verdict.
pub trait FingeringScorer: Send + Sync {
    fn score(&self, candidate: &Fingering, history: &FingeringHistory) -> Verdict;
}

/// Weighted sum of hand-tuned heuristics: compactness, neck position, barre
/// economy, transition cost and open-string preference.
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    weights: ScoringWeights,
    open_pitches: Vec<u8>,
    /// Strings at or above this index count as low strings.
    low_string_floor: usize,
}

impl HeuristicScorer {
    pub fn new(weights: ScoringWeights, geometry: &PitchGeometry) -> Self {
        let string_count = geometry.string_count();
        Self {
            weights,
            open_pitches: geometry.open_pitches().to_vec(),
            low_string_floor: string_count.saturating_sub(2),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    fn neck_position(&self, candidate: &Fingering) -> f64 {
        let w = &self.weights;
        let mean = candidate.mean_fret();

        if mean >= w.sweet_spot_low as f64 && mean <= w.sweet_spot_high as f64 {
            return w.sweet_spot_bonus;
        }
        if mean > w.sweet_spot_high as f64 {
            let mut penalty = (mean - w.sweet_spot_high as f64) * w.high_fret_penalty;
            if candidate
                .positions()
                .iter()
                .any(|p| p.string >= self.low_string_floor)
            {
                penalty *= w.low_string_high_fret_multiplier;
            }
            return -penalty;
        }
        0.0
    }

    fn barre(&self, candidate: &Fingering) -> f64 {
        let mut counts: HashMap<u8, usize> = HashMap::new();
        for position in candidate.positions().iter().filter(|p| !p.is_open()) {
            *counts.entry(position.fret).or_default() += 1;
        }
        let Some(most) = counts.values().copied().max() else {
            return 0.0;
        };
        let extra = most.saturating_sub(1) as f64;
        extra * self.weights.barre_bonus - extra * self.weights.barre_penalty
    }

    fn fretted_open_pitches(&self, candidate: &Fingering) -> usize {
        candidate
            .positions()
            .iter()
            .filter(|p| !p.is_open())
            .filter_map(|p| self.open_pitches.get(p.string).map(|open| open + p.fret))
            .filter(|pitch| self.open_pitches.contains(pitch))
            .count()
    }

    /// Transition terms against the previous fingering, or a disqualification.
    fn transition(&self, candidate: &Fingering, history: &FingeringHistory) -> Result<f64, Disqualification> {
        let Some(previous) = history.previous() else {
            return Ok(0.0);
        };
        let w = &self.weights;
        let mut score = 0.0;

        score -= (candidate.mean_fret() - previous.mean_fret()).abs() * w.movement_penalty;

        let current_strings = candidate.strings();
        let previous_strings = previous.strings();
        let switched = current_strings
            .symmetric_difference(&previous_strings)
            .count();
        score -= switched as f64 * w.string_switch_penalty;

        // Open strings never hold the fretting hand, so only fretted notes
        // limit the reach into the next slice.
        if w.diagonal_span_penalty {
            let mut frets: Vec<u8> = candidate.span_frets(true).collect();
            frets.extend(previous.span_frets(true));
            if w.let_ring_bonus > 0.0 {
                if let Some(earlier) = history.before_previous() {
                    frets.extend(earlier.span_frets(true));
                }
            }
            let span = fret_span(frets);
            if span > w.unplayable_fret_span {
                return Err(Disqualification::DiagonalSpan { span });
            }
        }

        let ringing = previous_strings.difference(&current_strings).count();
        score += ringing as f64 * w.let_ring_bonus;

        Ok(score)
    }
}

impl FingeringScorer for HeuristicScorer {
    fn score(&self, candidate: &Fingering, history: &FingeringHistory) -> Verdict {
        let w = &self.weights;

        let span = candidate.fret_span(w.ignore_open);
        if span > w.unplayable_fret_span {
            return Verdict::Disqualified {
                reason: Disqualification::FretSpan { span },
            };
        }

        let mut score = -(span as f64) * w.fret_span_penalty;
        score += self.neck_position(candidate);
        score += self.barre(candidate);

        match self.transition(candidate, history) {
            Ok(transition) => score += transition,
            Err(reason) => return Verdict::Disqualified { reason },
        }

        if w.prefer_open {
            score -= self.fretted_open_pitches(candidate) as f64 * w.fretted_open_penalty;
        }

        Verdict::Playable { score }
    }
}
