//! Note names, MIDI numbers and frequencies.

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];

/// Parse a note name such as `"E4"`, `"C#5"` or `"Eb3"` into a MIDI pitch.
///
/// Returns `None` for malformed names or pitches outside 0–127.
pub fn note_name_to_pitch(name: &str) -> Option<u8> {
    let mut chars = name.trim().chars().peekable();

    let letter = chars.next()?.to_ascii_uppercase();
    let mut pitch_class: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    match chars.peek() {
        Some('#') => {
            pitch_class += 1;
            chars.next();
        }
        Some('b') => {
            pitch_class -= 1;
            chars.next();
        }
        _ => {}
    }

    let octave: String = chars.collect();
    let octave: i32 = octave.parse().ok()?;

    let pitch = pitch_class + (octave + 1) * 12;
    u8::try_from(pitch).ok().filter(|p| *p <= 127)
}

/// Name a MIDI pitch, e.g. 60 → `"C4"`.
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

/// Equal-tempered frequency of a MIDI pitch.
pub fn midi_to_hz(pitch: u8, a4_hz: f64) -> f64 {
    a4_hz * 2f64.powf((pitch as f64 - 69.0) / 12.0)
}
