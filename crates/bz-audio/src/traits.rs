//! Tone output trait and error types.

/// Error type for tone output operations.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Failed to initialize the output device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create the output stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
    /// No output device available
    #[error("no output device available")]
    NoDevice,
    /// The device stopped accepting commands
    #[error("output {0} is disconnected")]
    Disconnected(usize),
    /// The command queue to the device is full
    #[error("output {0} command queue is full")]
    QueueFull(usize),
    /// The device refused a request
    #[error("output rejected request: {0}")]
    Rejected(String),
}

/// A single tone-generating output.
///
/// Each implementation is driven by exactly one channel.
pub trait ToneOutput {
    /// Start emitting `frequency` Hz. A frequency of 0 silences the output.
    fn set_tone(&mut self, frequency: f32) -> Result<(), OutputError>;

    /// Stop emitting. Calling this on a silent output has no further effect.
    fn silence(&mut self) -> Result<(), OutputError>;
}

impl<T: ToneOutput + ?Sized> ToneOutput for Box<T> {
    fn set_tone(&mut self, frequency: f32) -> Result<(), OutputError> {
        (**self).set_tone(frequency)
    }

    fn silence(&mut self) -> Result<(), OutputError> {
        (**self).silence()
    }
}
