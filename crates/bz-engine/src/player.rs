//! Playback of one channel against the tone output it owns.

use bz_audio::ToneOutput;
use bz_formats::EventFormat;
use bz_ir::{ChannelId, TempoScale};
use std::time::Duration;
use tokio::time::{self, Instant};

use crate::barrier::SyncBarrier;
use crate::error::ChannelError;
use crate::source::ChannelSource;

/// Lifecycle of a channel: `Waiting -> Playing -> Finished | Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// Opening the source and waiting for the barrier
    Waiting,
    /// Walking the event sequence
    Playing,
    /// Every event played, output silenced
    Finished,
    /// Stopped early; siblings are unaffected
    Failed,
}

/// Outcome of one channel's run.
#[derive(Debug)]
pub struct ChannelReport {
    pub id: ChannelId,
    pub outcome: Result<(), ChannelError>,
    /// Events whose tone/sleep/silence triplet completed
    pub events_played: usize,
    /// Malformed lines skipped
    pub lines_skipped: usize,
    /// When the channel left the barrier, if it got that far
    pub started_at: Option<Instant>,
}

impl ChannelReport {
    fn new(id: ChannelId) -> Self {
        Self {
            id,
            outcome: Ok(()),
            events_played: 0,
            lines_skipped: 0,
            started_at: None,
        }
    }

    /// Report for a channel whose task never returned.
    pub(crate) fn aborted(id: ChannelId, reason: String) -> Self {
        let mut report = Self::new(id);
        report.outcome = Err(ChannelError::Aborted(reason));
        report
    }

    /// Terminal state of the channel.
    pub fn state(&self) -> ChannelState {
        match self.outcome {
            Ok(()) => ChannelState::Finished,
            Err(_) => ChannelState::Failed,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Drives one channel's events into one exclusively owned output.
pub struct ChannelPlayer<O> {
    id: ChannelId,
    source: ChannelSource,
    format: EventFormat,
    output: O,
    state: ChannelState,
}

impl<O: ToneOutput> ChannelPlayer<O> {
    /// Create a player. The output is moved in and never shared.
    pub fn new(id: ChannelId, source: ChannelSource, format: EventFormat, output: O) -> Self {
        Self {
            id,
            source,
            format,
            output,
            state: ChannelState::Waiting,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn source(&self) -> &ChannelSource {
        &self.source
    }

    /// Best-effort stop used when the channel never gets to run.
    pub(crate) fn silence_output(&mut self) {
        if let Err(e) = self.output.silence() {
            log::warn!("{}: could not silence output: {}", self.id, e);
        }
    }

    /// Play the whole channel, starting at `barrier`.
    ///
    /// Never returns an error: failures end up in the report so that a
    /// broken channel cannot take its siblings down.
    pub async fn run(mut self, barrier: SyncBarrier, tempo: TempoScale) -> ChannelReport {
        let mut report = ChannelReport::new(self.id);
        let result = self.play(barrier, tempo, &mut report).await;

        match &result {
            Ok(()) => {
                self.enter(ChannelState::Finished);
                log::info!(
                    "{}: finished, {} events played, {} lines skipped",
                    self.id,
                    report.events_played,
                    report.lines_skipped
                );
            }
            Err(err) => {
                self.enter(ChannelState::Failed);
                log::warn!("{}: failed after {} events: {}", self.id, report.events_played, err);
                self.silence_output();
            }
        }

        report.outcome = result;
        report
    }

    async fn play(
        &mut self,
        barrier: SyncBarrier,
        tempo: TempoScale,
        report: &mut ChannelReport,
    ) -> Result<(), ChannelError> {
        log::debug!("{}: opening {}", self.id, self.source.describe());
        let mut events = self.source.open(self.format).await?;

        let now = Instant::now();
        if now > barrier.target() {
            log::warn!(
                "{}: missed the start barrier by {:?}, starting late",
                self.id,
                now - barrier.target()
            );
        } else {
            log::debug!("{}: waiting {:?} for start", self.id, barrier.residual(now));
        }
        barrier.wait().await;

        self.enter(ChannelState::Playing);
        let start = Instant::now();
        report.started_at = Some(start);

        // Deadlines run from the start instant so per-event overhead does not
        // pile up. A channel that has fallen behind re-anchors on the current
        // instant and still gives the event its full length.
        let mut deadline = start;
        loop {
            let next = events.next_event().await;
            report.lines_skipped = events.skipped();
            let Some(event) = next? else {
                break;
            };

            if event.is_rest() {
                self.output.silence()?;
            } else {
                self.output.set_tone(event.frequency)?;
            }
            let span = tempo.apply(event.duration);
            deadline = step(deadline, span);
            let now = Instant::now();
            if deadline < step(now, tempo.floor()) {
                log::debug!(
                    "{}: {:?} behind schedule, re-anchoring",
                    self.id,
                    now.saturating_duration_since(deadline)
                );
                deadline = step(now, span);
            }
            time::sleep_until(deadline).await;
            self.output.silence()?;

            report.events_played += 1;
        }

        self.output.silence()?;
        Ok(())
    }

    fn enter(&mut self, state: ChannelState) {
        log::debug!("{}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
    }
}

/// Advance a deadline by `seconds`, rounded to whole microseconds.
fn step(deadline: Instant, seconds: f32) -> Instant {
    let span = Duration::from_micros((seconds as f64 * 1e6).round() as u64);
    deadline
        .checked_add(span)
        .unwrap_or_else(|| deadline + Duration::from_secs(86_400 * 365 * 30))
}
