use crate::event::MusicalEvent;
use std::collections::BTreeSet;

/// Notes that start together once onsets are snapped to the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlice {
    /// Quantized onset in beats.
    pub onset: f64,
    /// Indices into the time-sorted event list, in input order.
    pub members: Vec<usize>,
}

impl TimeSlice {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Snap `time` to the nearest multiple of `resolution`.
pub fn quantize_time(time: f64, resolution: f64) -> f64 {
    grid_step(time, resolution) as f64 * resolution
}

fn grid_step(time: f64, resolution: f64) -> i64 {
    (time / resolution).round() as i64
}

/// Stable sort by onset. Events sharing a time keep their input order.
pub fn sort_by_time(events: &mut [MusicalEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// Group time-sorted events whose onsets fall on the same grid step.
pub fn group_by_onset(events: &[MusicalEvent], resolution: f64) -> Vec<TimeSlice> {
    let mut slices: Vec<TimeSlice> = Vec::new();
    let mut current_step: Option<i64> = None;

    for (idx, event) in events.iter().enumerate() {
        let step = grid_step(event.time, resolution);
        match slices.last_mut() {
            Some(slice) if current_step == Some(step) => slice.members.push(idx),
            _ => {
                slices.push(TimeSlice {
                    onset: step as f64 * resolution,
                    members: vec![idx],
                });
                current_step = Some(step);
            }
        }
    }

    slices
}

/// Keep the first note of each pitch within a slice, comparing pitches
/// through `normalize`. Returns the indices removed.
pub fn deduplicate(
    slice: &mut TimeSlice,
    events: &[MusicalEvent],
    normalize: impl Fn(u8) -> u8,
) -> Vec<usize> {
    let mut seen: BTreeSet<u8> = BTreeSet::new();
    let mut removed = Vec::new();
    slice.members.retain(|&idx| {
        if seen.insert(normalize(events[idx].pitch)) {
            true
        } else {
            removed.push(idx);
            false
        }
    });
    removed
}

/// Reduce a slice to its lowest note. Returns the indices removed.
pub fn keep_lowest(slice: &mut TimeSlice, events: &[MusicalEvent]) -> Vec<usize> {
    let Some(&lowest) = slice
        .members
        .iter()
        .min_by_key(|&&idx| events[idx].pitch)
    else {
        return Vec::new();
    };
    let removed: Vec<usize> = slice
        .members
        .iter()
        .copied()
        .filter(|&idx| idx != lowest)
        .collect();
    slice.members = vec![lowest];
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_events(specs: &[(f64, u8)]) -> Vec<MusicalEvent> {
        specs
            .iter()
            .map(|&(time, pitch)| MusicalEvent::new(time, pitch, 0.5, 100))
            .collect()
    }

    #[test]
    fn quantize_rounds_to_grid() {
        assert_eq!(quantize_time(0.06, 0.125), 0.0);
        assert_eq!(quantize_time(0.07, 0.125), 0.125);
        assert_eq!(quantize_time(1.0, 0.25), 1.0);
        assert_eq!(quantize_time(0.9, 0.5), 1.0);
    }

    #[test]
    fn near_simultaneous_notes_form_one_chord() {
        let mut events = make_events(&[(0.02, 64), (0.0, 59), (0.5, 55), (0.51, 50)]);
        sort_by_time(&mut events);
        let slices = group_by_onset(&events, 0.125);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].members, vec![0, 1]);
        assert_eq!(events[slices[0].members[0]].pitch, 59);
        assert_eq!(slices[1].onset, 0.5);
        assert_eq!(slices[1].len(), 2);
    }

    #[test]
    fn sort_is_stable_for_shared_onsets() {
        let mut events = make_events(&[(1.0, 60), (0.0, 72), (1.0, 48)]);
        sort_by_time(&mut events);
        let pitches: Vec<u8> = events.iter().map(|e| e.pitch).collect();
        assert_eq!(pitches, vec![72, 60, 48]);
    }

    #[test]
    fn empty_input_has_no_slices() {
        assert!(group_by_onset(&[], 0.125).is_empty());
    }

    #[test]
    fn dedupe_compares_normalized_pitch() {
        let events = make_events(&[(0.0, 64), (0.0, 100), (0.0, 67), (0.0, 64)]);
        let mut slice = group_by_onset(&events, 0.125).remove(0);

        // Fold everything above 88 down an octave, like a standard guitar.
        let removed = deduplicate(&mut slice, &events, |p| if p > 88 { p - 12 } else { p });

        assert_eq!(slice.members, vec![0, 1, 2]);
        assert_eq!(removed, vec![3]);
    }

    #[test]
    fn keep_lowest_picks_bass_note() {
        let events = make_events(&[(0.0, 64), (0.0, 40), (0.0, 52)]);
        let mut slice = group_by_onset(&events, 0.125).remove(0);
        let removed = keep_lowest(&mut slice, &events);
        assert_eq!(slice.members, vec![1]);
        assert_eq!(removed, vec![0, 2]);
    }
}
