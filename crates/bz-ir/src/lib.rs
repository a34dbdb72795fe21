//! Core types for the buzzline tone sequencer.
//!
//! Every channel file decodes into a flat list of [`Event`]s; the engine
//! consumes them one at a time, scaling each duration through a shared
//! [`TempoScale`].
//!
//! Designed to be `no_std` compatible.

#![cfg_attr(not(feature = "std"), no_std)]

mod channel;
mod event;
mod pitch;
mod tempo;

pub use channel::{ChannelId, MAX_CHANNELS};
pub use event::Event;
pub use pitch::{note_to_frequency, ticks_to_seconds, DEFAULT_TEMPO_US, DEFAULT_TICKS_PER_BEAT};
pub use tempo::{scale, TempoScale, MIN_DURATION};
