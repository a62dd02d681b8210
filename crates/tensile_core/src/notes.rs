/// Equal-tempered note frequencies (A4 = 440 Hz) for the range the scene uses.
pub const NOTE_TABLE: &[(&str, f32)] = &[
    ("B2", 123.47),
    ("C3", 130.81),
    ("C#3", 138.59),
    ("D3", 146.83),
    ("D#3", 155.56),
    ("E3", 164.81),
    ("F3", 174.61),
    ("F#3", 185.00),
    ("G3", 196.00),
    ("G#3", 207.65),
    ("A3", 220.00),
    ("A#3", 233.08),
    ("B3", 246.94),
    ("C4", 261.63),
    ("C#4", 277.18),
    ("D4", 293.66),
    ("D#4", 311.13),
    ("E4", 329.63),
    ("F4", 349.23),
    ("F#4", 369.99),
    ("G4", 392.00),
    ("G#4", 415.30),
    ("A4", 440.00),
    ("A#4", 466.16),
    ("B4", 493.88),
    ("C5", 523.25),
    ("C#5", 554.37),
    ("D5", 587.33),
];

/// Canonical spelling of a note name: upper case, with `S` accepted for `#`
/// so names survive contexts where `#` is awkward (`cs4` → `C#4`).
pub fn normalize_note_name(name: &str) -> String {
    name.trim().to_uppercase().replace('S', "#")
}

/// Frequency in Hz of a note name such as `"C#4"` or `"cs4"`.
pub fn note_to_hz(name: &str) -> Option<f32> {
    let name = normalize_note_name(name);
    NOTE_TABLE
        .iter()
        .find(|(note, _)| *note == name)
        .map(|&(_, hz)| hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_hz_exact() {
        assert_eq!(note_to_hz("A4"), Some(440.0));
        assert_eq!(note_to_hz("C3"), Some(130.81));
    }

    #[test]
    fn test_note_to_hz_sharp_spellings() {
        assert_eq!(note_to_hz("C#4"), Some(277.18));
        assert_eq!(note_to_hz("cs4"), Some(277.18));
        assert_eq!(note_to_hz(" f#3 "), Some(185.00));
    }

    #[test]
    fn test_note_to_hz_unknown() {
        assert_eq!(note_to_hz("H2"), None);
        assert_eq!(note_to_hz("C9"), None);
        assert_eq!(note_to_hz(""), None);
    }

    #[test]
    fn test_table_is_ascending() {
        for pair in NOTE_TABLE.windows(2) {
            assert!(pair[0].1 < pair[1].1, "{} !< {}", pair[0].0, pair[1].0);
        }
    }
}
