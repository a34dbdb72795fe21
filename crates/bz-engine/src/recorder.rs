//! A tone output that records every request instead of making sound.
//!
//! Shared through `Rc` because sessions run on a single thread.

use bz_audio::{OutputError, ToneOutput};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::time::Instant;

/// One request made to an output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToneCall {
    Tone(f32),
    Silence,
}

/// A request and the instant it was made.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recorded {
    pub at: Instant,
    pub call: ToneCall,
}

/// Read side of a [`RecordingOutput`], kept by whoever inspects it later.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    calls: Rc<RefCell<Vec<Recorded>>>,
}

impl Recording {
    /// Snapshot of every request so far.
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.borrow().clone()
    }

    /// Requests without their timestamps.
    pub fn sequence(&self) -> Vec<ToneCall> {
        self.calls.borrow().iter().map(|r| r.call).collect()
    }

    /// The first request that started a tone.
    pub fn first_tone(&self) -> Option<Recorded> {
        self.calls
            .borrow()
            .iter()
            .find(|r| matches!(r.call, ToneCall::Tone(_)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Whether the last request left the output silent.
    pub fn ends_silent(&self) -> bool {
        matches!(
            self.calls.borrow().last(),
            None | Some(Recorded {
                call: ToneCall::Silence,
                ..
            })
        )
    }
}

/// Records every request with a timestamp from the runtime clock.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    recording: Recording,
    /// Reject every request once this many have been accepted
    fail_after: Option<usize>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An output that accepts `accepted` requests and rejects the rest.
    pub fn failing_after(accepted: usize) -> Self {
        Self {
            recording: Recording::default(),
            fail_after: Some(accepted),
        }
    }

    /// Handle for reading the requests after the output has been moved.
    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }

    fn record(&mut self, call: ToneCall) -> Result<(), OutputError> {
        let mut calls = self.recording.calls.borrow_mut();
        if self.fail_after.is_some_and(|limit| calls.len() >= limit) {
            return Err(OutputError::Rejected(format!("{:?} after {} calls", call, calls.len())));
        }
        log::debug!("recorded {:?}", call);
        calls.push(Recorded {
            at: Instant::now(),
            call,
        });
        Ok(())
    }
}

impl ToneOutput for RecordingOutput {
    fn set_tone(&mut self, frequency: f32) -> Result<(), OutputError> {
        if frequency <= 0.0 {
            return self.silence();
        }
        self.record(ToneCall::Tone(frequency))
    }

    fn silence(&mut self) -> Result<(), OutputError> {
        self.record(ToneCall::Silence)
    }
}
