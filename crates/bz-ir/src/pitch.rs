//! MIDI pitch and tick conversions.

/// Microseconds per beat when a stream sets no tempo (120 BPM).
pub const DEFAULT_TEMPO_US: u32 = 500_000;

/// Tick resolution when a stream carries no header.
pub const DEFAULT_TICKS_PER_BEAT: u32 = 480;

/// Equal-tempered frequency of a MIDI note, A4 (69) = 440 Hz.
pub fn note_to_frequency(note: u8) -> f32 {
    440.0 * libm::powf(2.0, (note as f32 - 69.0) / 12.0)
}

/// Convert a tick span to seconds at `tempo_us` microseconds per beat.
///
/// Returns 0 for a zero tick resolution.
pub fn ticks_to_seconds(ticks: u64, tempo_us: u32, ticks_per_beat: u32) -> f32 {
    if ticks_per_beat == 0 {
        return 0.0;
    }
    let beats = ticks as f64 / ticks_per_beat as f64;
    (beats * tempo_us as f64 / 1_000_000.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert_eq!(note_to_frequency(69), 440.0);
        assert!((note_to_frequency(81) - 880.0).abs() < 0.01);
        assert!((note_to_frequency(60) - 261.63).abs() < 0.01);
    }

    #[test]
    fn one_beat_at_default_tempo_is_half_a_second() {
        let secs = ticks_to_seconds(480, DEFAULT_TEMPO_US, DEFAULT_TICKS_PER_BEAT);
        assert!((secs - 0.5).abs() < 1e-6);
        assert_eq!(ticks_to_seconds(480, DEFAULT_TEMPO_US, 0), 0.0);
    }
}
