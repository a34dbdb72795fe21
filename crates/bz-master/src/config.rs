//! Session configuration, loadable from JSON.

use bz_engine::SessionError;
use bz_formats::EventFormat;
use bz_ir::{TempoScale, MAX_CHANNELS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One channel: an event file and how to decode it.
///
/// The channel's position in [`SessionConfig::channels`] is its id and the
/// index of the output it drives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: EventFormat,
}

impl ChannelConfig {
    pub fn new(path: impl Into<PathBuf>, format: EventFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

/// Everything fixed before a session starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub channels: Vec<ChannelConfig>,
    /// Duration multiplier; above 1 slows playback down
    pub tempo: f32,
    /// Slack between session start and the common channel start
    pub lead_time_ms: u64,
    /// Shortest sleep between requests
    pub min_duration_ms: f32,
    /// Combined peak output level (0..1]
    pub level: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            tempo: 1.0,
            lead_time_ms: 2000,
            min_duration_ms: bz_ir::MIN_DURATION * 1000.0,
            level: 0.25,
        }
    }
}

impl SessionConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn lead_time(&self) -> Duration {
        Duration::from_millis(self.lead_time_ms)
    }

    /// Check the configuration and build the session tempo.
    pub fn validate(&self) -> Result<TempoScale, SessionError> {
        match self.channels.len() {
            0 => return Err(SessionError::NoChannels),
            n if n > MAX_CHANNELS => return Err(SessionError::TooManyChannels(n)),
            _ => {}
        }
        if !(self.level.is_finite() && self.level > 0.0 && self.level <= 1.0) {
            return Err(SessionError::InvalidLevel(self.level));
        }

        let floor = self.min_duration_ms / 1000.0;
        TempoScale::new(self.tempo, floor).ok_or(SessionError::InvalidTempo {
            multiplier: self.tempo,
            floor,
        })
    }
}
