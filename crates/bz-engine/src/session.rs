//! Fan-out of channel players with join-all completion.

use bz_audio::ToneOutput;
use bz_ir::{ChannelId, TempoScale, MAX_CHANNELS};
use std::fmt;
use std::time::Duration;
use tokio::task::{self, LocalSet};

use crate::barrier::SyncBarrier;
use crate::error::SessionError;
use crate::player::{ChannelPlayer, ChannelReport};

/// One playback session: up to [`MAX_CHANNELS`] players sharing one tempo
/// and one start barrier.
pub struct Session<O> {
    players: heapless::Vec<ChannelPlayer<O>, MAX_CHANNELS>,
    tempo: TempoScale,
    lead_time: Duration,
}

impl<O: ToneOutput + 'static> Session<O> {
    /// Create an empty session. `lead_time` is the slack every channel gets
    /// to open its source before the common start.
    pub fn new(tempo: TempoScale, lead_time: Duration) -> Self {
        Self {
            players: heapless::Vec::new(),
            tempo,
            lead_time,
        }
    }

    /// Claim a channel for this session.
    ///
    /// A rejected player has its output silenced before it is dropped.
    pub fn add_channel(&mut self, mut player: ChannelPlayer<O>) -> Result<(), SessionError> {
        if self.players.iter().any(|p| p.id() == player.id()) {
            player.silence_output();
            return Err(SessionError::DuplicateChannel(player.id()));
        }
        // Capacity guard: ids are bounded by MAX_CHANNELS and unique, so the
        // table cannot be full here unless those bounds change.
        if let Err(mut rejected) = self.players.push(player) {
            rejected.silence_output();
            return Err(SessionError::TooManyChannels(self.players.len() + 1));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn tempo(&self) -> TempoScale {
        self.tempo
    }

    /// Give up before starting: silence every claimed output and drop the players.
    pub fn abort(self) {
        log::warn!("aborting session with {} claimed channels", self.players.len());
        for mut player in self.players {
            player.silence_output();
        }
    }

    /// Run every channel to a terminal state.
    ///
    /// The barrier is computed once, before any player is spawned. Players
    /// run as local tasks on the current thread; a failed or panicked player
    /// is recorded and the others keep playing.
    pub async fn run(self) -> SessionReport {
        let Session {
            players,
            tempo,
            lead_time,
        } = self;

        LocalSet::new()
            .run_until(async move {
                let barrier = SyncBarrier::compute(lead_time);
                log::info!(
                    "starting {} channels in {:?} at tempo x{}",
                    players.len(),
                    lead_time,
                    tempo.multiplier()
                );

                let mut handles = Vec::with_capacity(players.len());
                for player in players {
                    let id = player.id();
                    handles.push((id, task::spawn_local(player.run(barrier, tempo))));
                }

                let mut report = SessionReport::default();
                for (id, handle) in handles {
                    let channel = match handle.await {
                        Ok(channel) => channel,
                        Err(e) => {
                            log::error!("{}: player task died: {}", id, e);
                            ChannelReport::aborted(id, e.to_string())
                        }
                    };
                    report.channels.push(channel);
                }

                log::info!(
                    "session done: {} finished, {} failed",
                    report.finished().count(),
                    report.failed().count()
                );
                report
            })
            .await
    }
}

/// Per-channel results of a session, in the order channels were added.
#[derive(Debug, Default)]
pub struct SessionReport {
    channels: Vec<ChannelReport>,
}

impl SessionReport {
    pub fn channels(&self) -> &[ChannelReport] {
        &self.channels
    }

    pub fn channel(&self, id: ChannelId) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn finished(&self) -> impl Iterator<Item = &ChannelReport> {
        self.channels.iter().filter(|c| c.is_finished())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ChannelReport> {
        self.channels.iter().filter(|c| !c.is_finished())
    }

    pub fn all_finished(&self) -> bool {
        self.channels.iter().all(ChannelReport::is_finished)
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for channel in &self.channels {
            match &channel.outcome {
                Ok(()) => writeln!(
                    f,
                    "{}  finished  {} events, {} lines skipped",
                    channel.id, channel.events_played, channel.lines_skipped
                )?,
                Err(err) => writeln!(
                    f,
                    "{}  FAILED    after {} events: {}",
                    channel.id, channel.events_played, err
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use crate::player::ChannelState;
    use crate::recorder::{Recording, RecordingOutput, ToneCall};
    use crate::source::ChannelSource;
    use bz_audio::OutputError;
    use bz_formats::EventFormat;
    use tokio::time::Instant;

    fn ch(index: u8) -> ChannelId {
        ChannelId::new(index).unwrap()
    }

    fn player(index: u8, source: ChannelSource) -> (ChannelPlayer<RecordingOutput>, Recording) {
        let output = RecordingOutput::new();
        let recording = output.recording();
        (
            ChannelPlayer::new(ch(index), source, EventFormat::Pairs, output),
            recording,
        )
    }

    fn timeline(recording: &Recording, origin: Instant) -> Vec<(Duration, ToneCall)> {
        recording
            .calls()
            .iter()
            .map(|r| (r.at - origin, r.call))
            .collect()
    }

    const MELODY: &str = "440,0.25\n0,0.25\n523.25,0.5\n";

    #[tokio::test(start_paused = true)]
    async fn leading_rests_end_together() {
        let mut session = Session::new(TempoScale::default(), Duration::from_millis(500));
        let (a, rec_a) = player(0, ChannelSource::inline("0,0.5\n440,1\n"));
        let (b, rec_b) = player(1, ChannelSource::inline("0,0.5\n660,1\n"));
        session.add_channel(a).unwrap();
        session.add_channel(b).unwrap();

        let report = session.run().await;
        assert!(report.all_finished());

        let start_a = report.channel(ch(0)).unwrap().started_at.unwrap();
        let start_b = report.channel(ch(1)).unwrap().started_at.unwrap();
        assert_eq!(start_a, start_b);

        let first_a = rec_a.first_tone().unwrap();
        let first_b = rec_b.first_tone().unwrap();
        assert_eq!(first_a.at, first_b.at);
        assert_eq!(first_a.at - start_a, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_channel_fails_alone() {
        let mut session = Session::new(TempoScale::default(), Duration::from_secs(1));
        let (a, rec_a) = player(0, ChannelSource::inline(MELODY));
        let (b, rec_b) = player(1, ChannelSource::file("/missing/melody2.csv"));
        let (c, rec_c) = player(2, ChannelSource::inline(MELODY));
        let (d, rec_d) = player(3, ChannelSource::inline(MELODY));
        for p in [a, b, c, d] {
            session.add_channel(p).unwrap();
        }

        let report = session.run().await;
        let states: Vec<ChannelState> = report.channels().iter().map(|c| c.state()).collect();
        assert_eq!(
            states,
            vec![
                ChannelState::Finished,
                ChannelState::Failed,
                ChannelState::Finished,
                ChannelState::Finished
            ]
        );
        assert!(matches!(
            report.channel(ch(1)).unwrap().outcome,
            Err(ChannelError::SourceUnavailable { .. })
        ));
        assert!(rec_b.first_tone().is_none());

        // Every surviving channel plays the same timeline from the shared start.
        let origin = report.channel(ch(0)).unwrap().started_at.unwrap();
        let expected = timeline(&rec_a, origin);
        assert_eq!(expected.len(), 7);
        assert_eq!(timeline(&rec_c, origin), expected);
        assert_eq!(timeline(&rec_d, origin), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_failure_does_not_cut_siblings_short() {
        let mut session = Session::new(TempoScale::default(), Duration::ZERO);
        let broken = RecordingOutput::failing_after(1);
        session
            .add_channel(ChannelPlayer::new(
                ch(0),
                ChannelSource::inline(MELODY),
                EventFormat::Pairs,
                broken,
            ))
            .unwrap();
        let (long, rec_long) = player(1, ChannelSource::inline("330,2\n0,1\n"));
        session.add_channel(long).unwrap();

        let report = session.run().await;
        assert!(matches!(
            report.channel(ch(0)).unwrap().outcome,
            Err(ChannelError::Driver(OutputError::Rejected(_)))
        ));
        let long_report = report.channel(ch(1)).unwrap();
        assert!(long_report.is_finished());
        assert_eq!(long_report.events_played, 2);

        let origin = long_report.started_at.unwrap();
        let last = rec_long.calls().last().copied().unwrap();
        assert_eq!(last.at - origin, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn tempo_is_shared_by_every_channel() {
        let tempo = TempoScale::with_multiplier(0.5).unwrap();
        let mut session = Session::new(tempo, Duration::ZERO);
        let (a, rec_a) = player(0, ChannelSource::inline("440,1\n"));
        let (b, rec_b) = player(2, ChannelSource::inline("0,1\n880,1\n"));
        session.add_channel(a).unwrap();
        session.add_channel(b).unwrap();

        let report = session.run().await;
        let origin = report.channel(ch(0)).unwrap().started_at.unwrap();
        assert_eq!(rec_a.calls()[1].at - origin, Duration::from_millis(500));
        assert_eq!(rec_b.first_tone().unwrap().at - origin, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn duplicate_channel_is_rejected_and_silenced() {
        let mut session = Session::new(TempoScale::default(), Duration::ZERO);
        let (a, _) = player(0, ChannelSource::inline(MELODY));
        let (again, rec_again) = player(0, ChannelSource::inline(MELODY));
        session.add_channel(a).unwrap();

        let err = session.add_channel(again).unwrap_err();
        assert!(matches!(err, SessionError::DuplicateChannel(id) if id == ch(0)));
        assert_eq!(rec_again.sequence(), vec![ToneCall::Silence]);
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn abort_silences_claimed_outputs() {
        let mut session = Session::new(TempoScale::default(), Duration::ZERO);
        let mut recordings = Vec::new();
        for index in 0..3 {
            let (p, rec) = player(index, ChannelSource::inline(MELODY));
            session.add_channel(p).unwrap();
            recordings.push(rec);
        }

        session.abort();
        for rec in recordings {
            assert_eq!(rec.sequence(), vec![ToneCall::Silence]);
        }
    }

    struct PanickingOutput;

    impl ToneOutput for PanickingOutput {
        fn set_tone(&mut self, _frequency: f32) -> Result<(), OutputError> {
            panic!("driver exploded");
        }

        fn silence(&mut self) -> Result<(), OutputError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_player_is_reported_as_failed() {
        let mut session: Session<Box<dyn ToneOutput>> =
            Session::new(TempoScale::default(), Duration::ZERO);
        session
            .add_channel(ChannelPlayer::new(
                ch(0),
                ChannelSource::inline(MELODY),
                EventFormat::Pairs,
                Box::new(PanickingOutput) as Box<dyn ToneOutput>,
            ))
            .unwrap();
        let healthy = RecordingOutput::new();
        let rec = healthy.recording();
        session
            .add_channel(ChannelPlayer::new(
                ch(1),
                ChannelSource::inline(MELODY),
                EventFormat::Pairs,
                Box::new(healthy) as Box<dyn ToneOutput>,
            ))
            .unwrap();

        let report = session.run().await;
        assert!(matches!(
            report.channel(ch(0)).unwrap().outcome,
            Err(ChannelError::Aborted(_))
        ));
        assert!(report.channel(ch(1)).unwrap().is_finished());
        assert_eq!(rec.len(), 7);
        assert!(report.to_string().contains("FAILED"));
    }
}
