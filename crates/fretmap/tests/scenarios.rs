//! End-to-end mapping behaviour over small musical passages.

use fretmap::{
    FretPosition, FretboardMapper, MapperConfig, MappingWarning, MusicalEvent, Technique, Tuning,
};
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, BTreeSet};

fn note(time: f64, pitch: u8) -> MusicalEvent {
    MusicalEvent::new(time, pitch, 0.25, 96)
}

fn default_mapper() -> FretboardMapper {
    FretboardMapper::new(MapperConfig::default()).unwrap()
}

/// A two-octave scale run followed by a handful of common chord shapes.
fn passage() -> Vec<MusicalEvent> {
    let mut events: Vec<MusicalEvent> = [40, 42, 44, 45, 47, 49, 51, 52, 54, 56, 57, 59, 61, 63, 64]
        .iter()
        .enumerate()
        .map(|(i, &p)| note(i as f64 * 0.5, p))
        .collect();

    let chords: [&[u8]; 4] = [
        &[40, 47, 52, 56, 59, 64],
        &[45, 52, 57, 61, 64],
        &[43, 47, 50, 55, 59, 67],
        &[50, 57, 62, 66],
    ];
    for (i, chord) in chords.iter().enumerate() {
        let time = 10.0 + i as f64 * 2.0;
        events.extend(chord.iter().map(|&p| note(time, p)));
    }
    events
}

#[test]
fn open_high_e_is_string_zero_fret_zero() {
    let result = default_mapper().map_events(&[note(0.0, 64)]);
    assert_eq!(result.events[0].position(), Some(FretPosition::new(0, 0)));
    assert_eq!(result.events[0].technique, Some(Technique::Pick));
    assert!(result.warnings.is_empty());
}

#[test]
fn two_note_chord_uses_two_strings_within_a_hand_span() {
    let result = default_mapper().map_events(&[note(0.0, 64), note(0.0, 67)]);
    let positions: Vec<FretPosition> = result.events.iter().filter_map(|e| e.position()).collect();

    assert_eq!(positions.len(), 2);
    assert_ne!(positions[0].string, positions[1].string);
    let frets: Vec<u8> = positions.iter().map(|p| p.fret).collect();
    assert!(frets.iter().max().unwrap() - frets.iter().min().unwrap() <= 4);
}

#[test]
fn unplayable_stretch_is_skipped_with_warning() {
    let result = default_mapper().map_events(&[note(0.0, 40), note(0.0, 88)]);

    assert!(result.events.iter().all(|e| !e.is_positioned()));
    assert!(result.events.iter().all(|e| e.technique.is_none()));
    assert_eq!(
        result.warnings,
        vec![MappingWarning::UnplayableChord {
            time: 0.0,
            pitches: vec![40, 88],
        }]
    );
}

#[test]
fn legato_depends_on_gap() {
    let events = [note(0.0, 69), note(0.25, 71), note(0.5, 69), note(2.0, 71)];
    let result = default_mapper().map_events(&events);

    let techniques: Vec<Option<Technique>> = result.events.iter().map(|e| e.technique).collect();
    assert_eq!(
        techniques,
        vec![
            Some(Technique::Pick),
            Some(Technique::HammerOn),
            Some(Technique::PullOff),
            Some(Technique::Pick),
        ]
    );
}

#[test]
fn single_string_mode_drops_notes_below_the_string() {
    let mut config = MapperConfig::default();
    config.grouping.single_string = Some(0);
    let mapper = FretboardMapper::new(config).unwrap();

    let result = mapper.map_events(&[note(0.0, 64), note(0.25, 67), note(0.5, 60)]);
    assert_eq!(result.events[0].position(), Some(FretPosition::new(0, 0)));
    assert_eq!(result.events[1].position(), Some(FretPosition::new(0, 3)));
    assert_eq!(result.events[1].technique, Some(Technique::HammerOn));
    assert!(!result.events[2].is_positioned());
    assert_eq!(
        result.warnings,
        vec![MappingWarning::OffString {
            time: 0.5,
            pitch: 60,
            string: 0,
            fret: -4,
        }]
    );
}

#[test]
fn chords_never_share_a_string_or_exceed_the_span() {
    let result = default_mapper().map_events(&passage());
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let mut by_onset: BTreeMap<u64, Vec<FretPosition>> = BTreeMap::new();
    for event in &result.events {
        let position = event.position().unwrap();
        assert!(position.fret <= 24);
        by_onset
            .entry((event.time * 1000.0) as u64)
            .or_default()
            .push(position);
    }

    for positions in by_onset.values() {
        let strings: BTreeSet<usize> = positions.iter().map(|p| p.string).collect();
        assert_eq!(strings.len(), positions.len());

        let frets: Vec<u8> = positions.iter().map(|p| p.fret).collect();
        let span = frets.iter().max().unwrap() - frets.iter().min().unwrap();
        assert!(span <= 4, "span {} in {:?}", span, positions);
    }
}

#[test]
fn positions_sound_the_requested_pitch() {
    let mapper = default_mapper();
    let result = mapper.map_events(&passage());
    for event in &result.events {
        let sounded = mapper.geometry().pitch_at(event.position().unwrap()).unwrap();
        assert_eq!(sounded, event.pitch);
    }
}

#[test]
fn mapping_is_deterministic_and_idempotent() {
    let mapper = default_mapper();
    let first = mapper.map_events(&passage());
    let second = mapper.map_events(&passage());
    assert_eq!(first, second);

    let remapped = mapper.map_events(&first.events);
    assert_eq!(remapped.events, first.events);
}

#[test]
fn capo_and_drop_tuning_stay_within_the_neck() {
    let mut config = MapperConfig::with_tuning(Tuning::DropD);
    config.instrument.capo = 3;
    config.instrument.max_fret = 20;
    let mapper = FretboardMapper::new(config).unwrap();

    let result = mapper.map_events(&passage());
    for event in result.positioned() {
        assert!(event.fret.unwrap() <= 17);
    }
    assert_eq!(
        result.stats.positioned + result.stats.unpositioned,
        result.events.len()
    );
}
