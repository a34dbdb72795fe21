//! Tempo scaling with a schedulable floor.

/// Shortest sleep the timer is asked for, in seconds.
pub const MIN_DURATION: f32 = 0.005;

/// Scale a duration by `multiplier`, clamped to [`MIN_DURATION`].
///
/// A NaN product also collapses to the floor.
pub fn scale(duration: f32, multiplier: f32) -> f32 {
    (duration * multiplier).max(MIN_DURATION)
}

/// Session-wide tempo: one multiplier and one floor for every channel.
///
/// Multipliers below 1 speed playback up, above 1 slow it down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoScale {
    multiplier: f32,
    floor: f32,
}

impl TempoScale {
    /// Create a tempo scale. Both values must be finite and positive.
    pub fn new(multiplier: f32, floor: f32) -> Option<Self> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(multiplier) && valid(floor) {
            Some(Self { multiplier, floor })
        } else {
            None
        }
    }

    /// Create a tempo scale with the default floor.
    pub fn with_multiplier(multiplier: f32) -> Option<Self> {
        Self::new(multiplier, MIN_DURATION)
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Scale one event duration (seconds).
    pub fn apply(&self, duration: f32) -> f32 {
        (duration * self.multiplier).max(self.floor)
    }
}

impl Default for TempoScale {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            floor: MIN_DURATION,
        }
    }
}
