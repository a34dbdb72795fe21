//! Channel identifiers.

use core::fmt;

/// Number of tone outputs a session can drive.
pub const MAX_CHANNELS: usize = 4;

/// Index of a playback lane (0..MAX_CHANNELS).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Create a channel id, or `None` if it is out of range.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < MAX_CHANNELS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Position of this channel in the output table.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// All valid channel ids in order.
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..MAX_CHANNELS as u8).map(ChannelId)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}
