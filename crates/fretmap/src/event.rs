use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single note with beat timing and, once mapped, its fretboard placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicalEvent {
    /// Onset in beats.
    pub time: f64,
    pub pitch: u8,
    /// Length in beats.
    pub duration: f64,
    pub velocity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fret: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<Technique>,
}

impl MusicalEvent {
    pub fn new(time: f64, pitch: u8, duration: f64, velocity: u8) -> Self {
        Self {
            time,
            pitch,
            duration,
            velocity,
            string: None,
            fret: None,
            technique: None,
        }
    }

    /// The placement chosen by the mapper, if any.
    pub fn position(&self) -> Option<FretPosition> {
        match (self.string, self.fret) {
            (Some(string), Some(fret)) => Some(FretPosition { string, fret }),
            _ => None,
        }
    }

    pub fn is_positioned(&self) -> bool {
        self.position().is_some()
    }

    pub(crate) fn place(&mut self, position: FretPosition) {
        self.string = Some(position.string);
        self.fret = Some(position.fret);
    }

    pub(crate) fn clear_placement(&mut self) {
        self.string = None;
        self.fret = None;
        self.technique = None;
    }
}

/// How a positioned note is articulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Technique {
    Pick,
    HammerOn,
    PullOff,
    Tap,
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Technique::Pick => write!(f, "pick"),
            Technique::HammerOn => write!(f, "hammer-on"),
            Technique::PullOff => write!(f, "pull-off"),
            Technique::Tap => write!(f, "tap"),
        }
    }
}

/// A string/fret pair. String 0 is the highest-pitched string; frets are
/// counted from the capo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FretPosition {
    pub string: usize,
    pub fret: u8,
}

impl FretPosition {
    pub fn new(string: usize, fret: u8) -> Self {
        Self { string, fret }
    }

    pub fn is_open(&self) -> bool {
        self.fret == 0
    }
}

impl fmt::Display for FretPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.string, self.fret)
    }
}

/// One position per note of a simultaneous group, index-aligned with the
/// group's notes. No two positions share a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingering(Vec<FretPosition>);

impl Fingering {
    /// Build a fingering, rejecting string collisions.
    pub fn new(positions: Vec<FretPosition>) -> Option<Self> {
        let strings: BTreeSet<usize> = positions.iter().map(|p| p.string).collect();
        (strings.len() == positions.len()).then_some(Self(positions))
    }

    pub fn positions(&self) -> &[FretPosition] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn strings(&self) -> BTreeSet<usize> {
        self.0.iter().map(|p| p.string).collect()
    }

    /// Mean fret over every position, open strings included.
    pub fn mean_fret(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().map(|p| p.fret as f64).sum::<f64>() / self.0.len() as f64
    }

    /// Frets that count toward hand stretch. Open strings are excluded only
    /// when `ignore_open` is set.
    pub fn span_frets(&self, ignore_open: bool) -> impl Iterator<Item = u8> + '_ {
        self.0
            .iter()
            .filter(move |p| !(ignore_open && p.is_open()))
            .map(|p| p.fret)
    }

    pub fn fret_span(&self, ignore_open: bool) -> u8 {
        fret_span(self.span_frets(ignore_open))
    }
}

impl fmt::Display for Fingering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}]", parts.join(" "))
    }
}

/// Distance between the highest and lowest fret, zero for fewer than two.
pub fn fret_span(frets: impl IntoIterator<Item = u8>) -> u8 {
    let mut min = u8::MAX;
    let mut max = 0u8;
    let mut any = false;
    for fret in frets {
        min = min.min(fret);
        max = max.max(fret);
        any = true;
    }
    if any {
        max - min
    } else {
        0
    }
}

/// A single part of a song.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub events: Vec<MusicalEvent>,
}

/// Format-agnostic song document exchanged with transcoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default = "Song::default_title")]
    pub title: String,
    #[serde(default = "Song::default_tempo")]
    pub tempo: f64,
    #[serde(default = "Song::default_time_signature")]
    pub time_signature: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Song {
    fn default_title() -> String {
        "Untitled".to_string()
    }

    fn default_tempo() -> f64 {
        120.0
    }

    fn default_time_signature() -> String {
        "4/4".to_string()
    }

    /// Wrap a bare event list as a single-track song.
    pub fn from_events(events: Vec<MusicalEvent>) -> Self {
        Self {
            tracks: vec![Track { name: None, events }],
            ..Self::default()
        }
    }
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            tempo: Self::default_tempo(),
            time_signature: Self::default_time_signature(),
            tracks: Vec::new(),
        }
    }
}
