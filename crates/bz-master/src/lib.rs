//! Headless controller for buzzline.
//!
//! Turns a [`SessionConfig`] into a running session: validates it, starts a
//! single-threaded runtime, claims one output per channel and plays.

mod config;

use bz_audio::{CpalToneBank, ToneOutput};
use bz_engine::{ChannelPlayer, ChannelSource, Session};
use bz_ir::{ChannelId, TempoScale};
use std::path::{Path, PathBuf};
use tokio::runtime::{Builder, Runtime};

// Re-export common types so callers don't need bz-engine directly.
pub use bz_engine::{ChannelReport, ChannelState, Recording, SessionError, SessionReport, ToneCall};
pub use bz_formats::EventFormat;
pub use config::{ChannelConfig, SessionConfig};

/// Error type for the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("session failed to start: {0}")]
    Session(#[from] SessionError),
}

/// Headless sequencer controller. Owns a session configuration.
pub struct Controller {
    config: SessionConfig,
}

impl Controller {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Load a JSON session configuration.
    pub fn from_file(path: &Path) -> Result<Self, ControllerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ControllerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(SessionConfig::from_json(&text)?))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    /// Play every channel on the default audio device.
    pub fn play(&self) -> Result<SessionReport, ControllerError> {
        let tempo = self.config.validate()?;
        let runtime = build_runtime()?;

        let (bank, voices) = CpalToneBank::open(self.config.channels.len(), self.config.level)
            .map_err(SessionError::from)?;
        log::info!("tone bank running at {} Hz", bank.sample_rate());

        let report = self.run_with(&runtime, tempo, voices)?;

        if !bank.is_alive() {
            log::warn!("tone stream reported errors during playback");
        }
        if let Err(e) = bank.pause() {
            log::warn!("could not pause tone stream: {}", e);
        }
        Ok(report)
    }

    /// Play every channel against recording outputs instead of a device.
    ///
    /// Returns the recordings in channel order.
    pub fn dry_run(&self) -> Result<(SessionReport, Vec<Recording>), ControllerError> {
        let tempo = self.config.validate()?;
        let runtime = build_runtime()?;

        let outputs: Vec<bz_engine::RecordingOutput> = self
            .config
            .channels
            .iter()
            .map(|_| bz_engine::RecordingOutput::new())
            .collect();
        let recordings = outputs.iter().map(|o| o.recording()).collect();

        let report = self.run_with(&runtime, tempo, outputs)?;
        Ok((report, recordings))
    }

    fn run_with<O: ToneOutput + 'static>(
        &self,
        runtime: &Runtime,
        tempo: TempoScale,
        outputs: Vec<O>,
    ) -> Result<SessionReport, ControllerError> {
        let mut session = Session::new(tempo, self.config.lead_time());
        let lanes = ChannelId::all().zip(&self.config.channels).zip(outputs);

        for ((id, channel), output) in lanes {
            let source = ChannelSource::file(&channel.path);
            let player = ChannelPlayer::new(id, source, channel.format, output);
            if let Err(e) = session.add_channel(player) {
                session.abort();
                return Err(e.into());
            }
        }

        Ok(runtime.block_on(session.run()))
    }
}

fn build_runtime() -> Result<Runtime, SessionError> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}
