//! Channel event file decoders.
//!
//! A channel file is read one line at a time. Each line either yields an
//! [`Event`](bz_ir::Event), is consumed without one, or is rejected as a
//! [`MalformedLine`] that the caller skips.

mod decoder;
mod midicsv;
mod pairs;

pub use decoder::{decode_str, Decoded, EventFormat, LineDecoder, UnknownFormat};
pub use midicsv::MidiCsvDecoder;
pub use pairs::{parse_line, PairDecoder};

/// Why a line was skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedLine {
    /// Field count differs from what the record needs
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    /// A field is not a number
    #[error("field {index} is not a number: {text:?}")]
    InvalidNumber { index: usize, text: String },
    /// A number is outside the range the field accepts
    #[error("field {index} out of range: {value}")]
    OutOfRange { index: usize, value: f32 },
    /// Record type this decoder does not understand
    #[error("unknown record {0:?}")]
    UnknownRecord(String),
}
