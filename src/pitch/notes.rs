const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// A4 = MIDI 69 = 440 Hz
const A4_HZ: f64 = 440.0;
const A4_MIDI: f64 = 69.0;

/// Fractional MIDI number for `hz`. Callers must pass a positive frequency.
pub fn frequency_to_midi(hz: f64) -> f64 {
    12.0 * (hz / A4_HZ).log2() + A4_MIDI
}

pub fn midi_to_frequency(midi: f64) -> f64 {
    A4_HZ * 2f64.powf((midi - A4_MIDI) / 12.0)
}

pub fn nearest_semitone(midi: f64) -> f64 {
    midi.round()
}

/// Name of the semitone nearest to `midi`, e.g. 69.2 -> "A4", 61 -> "C#4".
pub fn midi_to_note_name(midi: f64) -> String {
    let rounded = nearest_semitone(midi) as i32;
    let name = NOTE_NAMES[rounded.rem_euclid(12) as usize];
    let octave = rounded.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a440_is_midi_69() {
        assert_eq!(frequency_to_midi(440.0), 69.0);
        assert_eq!(midi_to_frequency(69.0), 440.0);
    }

    #[test]
    fn test_octaves() {
        assert!((frequency_to_midi(880.0) - 81.0).abs() < 1e-9);
        assert!((frequency_to_midi(220.0) - 57.0).abs() < 1e-9);
        assert!((frequency_to_midi(261.6256) - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(midi_to_note_name(69.0), "A4");
        assert_eq!(midi_to_note_name(60.0), "C4");
        assert_eq!(midi_to_note_name(61.0), "C#4");
        assert_eq!(midi_to_note_name(59.6), "C4");
        assert_eq!(midi_to_note_name(71.0), "B4");
        assert_eq!(midi_to_note_name(0.0), "C-1");
        assert_eq!(midi_to_note_name(127.0), "G9");
    }

    #[test]
    fn test_semitone_rounding_is_stable() {
        let mut midi = frequency_to_midi(452.0);
        for _ in 0..5 {
            let snapped = nearest_semitone(midi);
            let again = nearest_semitone(frequency_to_midi(midi_to_frequency(snapped)));
            assert_eq!(snapped, again);
            midi = again;
        }
        assert_eq!(midi, 69.0);
    }
}
