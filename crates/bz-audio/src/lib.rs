//! Tone outputs for buzzline.
//!
//! The sequencer only needs two capabilities from a peripheral: start a
//! tone and silence it. [`ToneOutput`] is that contract; [`CpalToneBank`]
//! implements it on a desktop audio device with one square-wave voice per
//! channel.

mod cpal_backend;
mod traits;

pub use cpal_backend::{CpalToneBank, CpalVoice, ToneCommand};
pub use traits::{OutputError, ToneOutput};
