//! Channel and session error types.

use bz_audio::OutputError;
use bz_ir::ChannelId;
use std::path::PathBuf;

/// Why a single channel stopped early. Never affects sibling channels.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The event source could not be opened
    #[error("cannot open {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The event source failed mid-stream
    #[error("read error: {0}")]
    SourceRead(#[source] std::io::Error),
    /// The tone output rejected a request
    #[error("tone output failed: {0}")]
    Driver(#[from] OutputError),
    /// The player task died without reporting
    #[error("player task aborted: {0}")]
    Aborted(String),
}

/// Failure before any channel starts. Fatal to the whole session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no channels configured")]
    NoChannels,
    #[error("too many channels: {0} (max {max})", max = bz_ir::MAX_CHANNELS)]
    TooManyChannels(usize),
    #[error("channel {0} configured twice")]
    DuplicateChannel(ChannelId),
    #[error("invalid tempo: multiplier {multiplier}, floor {floor}s")]
    InvalidTempo { multiplier: f32, floor: f32 },
    #[error("invalid output level {0}")]
    InvalidLevel(f32),
    #[error("output unavailable: {0}")]
    Output(#[from] OutputError),
    #[error("runtime start failed: {0}")]
    Runtime(#[from] std::io::Error),
}
