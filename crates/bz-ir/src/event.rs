//! Tone events.

/// One step of a channel: emit `frequency` for `duration` seconds.
///
/// A frequency of `0.0` is a rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    /// Hz, never negative
    pub frequency: f32,
    /// Seconds before tempo scaling, always positive
    pub duration: f32,
}

impl Event {
    /// Create a tone event.
    pub const fn new(frequency: f32, duration: f32) -> Self {
        Self {
            frequency,
            duration,
        }
    }

    /// Create a rest of the given length.
    pub const fn rest(duration: f32) -> Self {
        Self {
            frequency: 0.0,
            duration,
        }
    }

    /// Returns true if this event silences the output.
    pub fn is_rest(&self) -> bool {
        self.frequency <= 0.0
    }
}
