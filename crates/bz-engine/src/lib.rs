//! Playback engine for buzzline.
//!
//! A [`Session`] owns up to four [`ChannelPlayer`]s. It computes one
//! [`SyncBarrier`] and runs every player as a task on a single-threaded
//! `LocalSet`; each player waits for the barrier, then walks its channel
//! file one event at a time against the tone output it owns.

mod barrier;
mod error;
mod player;
mod recorder;
mod session;
mod source;

pub use barrier::{SyncBarrier, DEFAULT_LEAD_TIME};
pub use error::{ChannelError, SessionError};
pub use player::{ChannelPlayer, ChannelReport, ChannelState};
pub use recorder::{Recorded, Recording, RecordingOutput, ToneCall};
pub use session::{Session, SessionReport};
pub use source::{ChannelSource, EventStream};
