//! CPAL-based tone output backend.
//!
//! One stream mixes every voice. Each [`CpalVoice`] owns the producer end
//! of its own command queue, so a voice can only ever drive its own slot.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::traits::{OutputError, ToneOutput};

/// Pending commands per voice before a push is rejected.
const QUEUE_CAPACITY: usize = 64;

/// Command sent from a voice handle to the stream callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToneCommand {
    Tone(f32),
    Silence,
}

/// Oscillator state for one voice, owned by the stream callback.
struct VoiceState {
    commands: HeapCons<ToneCommand>,
    /// Phase in cycles, 0..1
    phase: f32,
    /// Cycles per output sample
    increment: f32,
    active: bool,
}

impl VoiceState {
    fn apply(&mut self, command: ToneCommand, sample_rate: f32) {
        match command {
            ToneCommand::Tone(frequency) if frequency > 0.0 => {
                self.increment = frequency / sample_rate;
                self.active = true;
            }
            _ => {
                self.active = false;
                self.phase = 0.0;
            }
        }
    }

    fn next_sample(&mut self, amplitude: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        let out = if self.phase < 0.5 { amplitude } else { -amplitude };
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        out
    }
}

/// An open output device driving a fixed number of square-wave voices.
///
/// Dropping the bank stops the stream.
pub struct CpalToneBank {
    config: StreamConfig,
    stream: Stream,
    alive: Arc<AtomicBool>,
}

/// Exclusive handle to one voice of a [`CpalToneBank`].
pub struct CpalVoice {
    index: usize,
    producer: HeapProd<ToneCommand>,
    alive: Arc<AtomicBool>,
    sounding: bool,
}

impl CpalToneBank {
    /// Open the default output device with `voices` independent voices.
    ///
    /// `level` is the combined peak amplitude (0..1) when every voice sounds.
    pub fn open(voices: usize, level: f32) -> Result<(Self, Vec<CpalVoice>), OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;

        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| OutputError::DeviceInit(e.to_string()))?
            .into();

        let alive = Arc::new(AtomicBool::new(true));
        let mut handles = Vec::with_capacity(voices);
        let mut states = Vec::with_capacity(voices);

        for index in 0..voices {
            let (producer, consumer) = HeapRb::<ToneCommand>::new(QUEUE_CAPACITY).split();
            handles.push(CpalVoice {
                index,
                producer,
                alive: alive.clone(),
                sounding: false,
            });
            states.push(VoiceState {
                commands: consumer,
                phase: 0.0,
                increment: 0.0,
                active: false,
            });
        }

        let channels = config.channels.max(1) as usize;
        let sample_rate = config.sample_rate.0 as f32;
        let amplitude = level.clamp(0.0, 1.0) / voices.max(1) as f32;
        let error_flag = alive.clone();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for voice in states.iter_mut() {
                        while let Some(command) = voice.commands.try_pop() {
                            voice.apply(command, sample_rate);
                        }
                    }

                    for frame in data.chunks_mut(channels) {
                        let mixed: f32 = states.iter_mut().map(|v| v.next_sample(amplitude)).sum();
                        for sample in frame.iter_mut() {
                            *sample = mixed;
                        }
                    }
                },
                move |err| {
                    log::error!("tone stream error: {}", err);
                    error_flag.store(false, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| OutputError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| OutputError::Playback(e.to_string()))?;
        log::info!(
            "opened tone bank: {} voices, {} Hz, {} channels",
            voices,
            config.sample_rate.0,
            config.channels
        );

        Ok((
            Self {
                config,
                stream,
                alive,
            },
            handles,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Returns false once the stream has reported an error.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Pause the stream; voices keep their state.
    pub fn pause(&self) -> Result<(), OutputError> {
        self.stream
            .pause()
            .map_err(|e| OutputError::Playback(e.to_string()))
    }
}

impl CpalVoice {
    pub fn index(&self) -> usize {
        self.index
    }

    fn send(&mut self, command: ToneCommand) -> Result<(), OutputError> {
        if !self.alive.load(Ordering::Relaxed) {
            return Err(OutputError::Disconnected(self.index));
        }
        self.producer
            .try_push(command)
            .map_err(|_| OutputError::QueueFull(self.index))
    }
}

impl ToneOutput for CpalVoice {
    fn set_tone(&mut self, frequency: f32) -> Result<(), OutputError> {
        if frequency <= 0.0 {
            return self.silence();
        }
        self.send(ToneCommand::Tone(frequency))?;
        self.sounding = true;
        Ok(())
    }

    fn silence(&mut self) -> Result<(), OutputError> {
        // Already silent: nothing to queue.
        if !self.sounding {
            return Ok(());
        }
        self.send(ToneCommand::Silence)?;
        self.sounding = false;
        Ok(())
    }
}
