//! Technique inference over positioned, time-ordered events.
//!
//! Consecutive notes on the same string that follow closely become hammer-ons
//! or pull-offs. In single-string passages, the top note of a long legato run
//! that is not simply where a descending cascade starts is marked as tapped.

use crate::config::TechniqueConfig;
use crate::event::{MusicalEvent, Technique};

/// Gaps shorter than this, in beats, belong to the same chord.
const SIMULTANEOUS_EPSILON: f64 = 0.01;

/// Technique for `current` given the note before it.
pub fn technique_between(
    previous: &MusicalEvent,
    current: &MusicalEvent,
    legato_time_threshold: f64,
) -> Technique {
    let (Some(prev_fret), Some(curr_fret)) = (previous.fret, current.fret) else {
        return Technique::Pick;
    };

    let gap = current.time - previous.time;
    if gap < SIMULTANEOUS_EPSILON || gap > legato_time_threshold {
        return Technique::Pick;
    }
    if previous.string != current.string {
        return Technique::Pick;
    }

    match curr_fret.cmp(&prev_fret) {
        std::cmp::Ordering::Greater => Technique::HammerOn,
        std::cmp::Ordering::Less => Technique::PullOff,
        std::cmp::Ordering::Equal => Technique::Pick,
    }
}

/// Label every positioned event in `events` (already sorted by time).
///
/// Unpositioned events are skipped and keep no technique. With articulations
/// disabled every positioned note is picked. Tap detection runs only when
/// `single_string` is set.
pub fn infer_techniques(events: &mut [MusicalEvent], config: &TechniqueConfig, single_string: bool) {
    let positioned: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_positioned())
        .map(|(idx, _)| idx)
        .collect();

    if !config.articulations {
        for &idx in &positioned {
            events[idx].technique = Some(Technique::Pick);
        }
        return;
    }

    let mut previous: Option<usize> = None;
    for &idx in &positioned {
        let technique = match previous {
            None => Technique::Pick,
            Some(prev) => {
                technique_between(&events[prev], &events[idx], config.legato_time_threshold)
            }
        };
        events[idx].technique = Some(technique);
        previous = Some(idx);
    }

    if single_string {
        mark_taps(events, &positioned, config.tapping_run_threshold);
    }
}

/// Relabel the top note of long legato runs as taps.
///
/// A run is a maximal stretch of non-picked notes. Runs of more than
/// `run_threshold` notes are considered; the run's highest pitch is tapped
/// unless the run opens on that pitch and never returns to it, which is just
/// a pull-off cascade from the top.
fn mark_taps(events: &mut [MusicalEvent], positioned: &[usize], run_threshold: usize) {
    for run in legato_runs(events, positioned) {
        if run.len() <= run_threshold {
            continue;
        }

        let Some(highest) = run.iter().map(|&idx| events[idx].pitch).max() else {
            continue;
        };
        let occurrences = run.iter().filter(|&&idx| events[idx].pitch == highest).count();
        let starts_on_top = events[run[0]].pitch == highest;
        if starts_on_top && occurrences == 1 {
            continue;
        }

        tracing::debug!(
            pitch = highest,
            run_length = run.len(),
            at = events[run[0]].time,
            "tapping detected"
        );
        for &idx in &run {
            if events[idx].pitch == highest {
                events[idx].technique = Some(Technique::Tap);
            }
        }
    }
}

fn legato_runs(events: &[MusicalEvent], positioned: &[usize]) -> Vec<Vec<usize>> {
    let mut runs = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for &idx in positioned {
        if events[idx].technique == Some(Technique::Pick) {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(idx);
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
