//! Channel event sources read as async line streams.

use bz_formats::{Decoded, EventFormat, LineDecoder};
use bz_ir::Event;
use std::io::Cursor;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::ChannelError;

/// Where a channel's event lines come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelSource {
    /// A file opened when the player starts
    File(PathBuf),
    /// Lines held in memory
    Inline(String),
}

impl ChannelSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ChannelSource::File(path.into())
    }

    pub fn inline(text: impl Into<String>) -> Self {
        ChannelSource::Inline(text.into())
    }

    /// Open the source and attach a fresh decoder for `format`.
    pub async fn open(&self, format: EventFormat) -> Result<EventStream, ChannelError> {
        let reader: Box<dyn AsyncBufRead + Unpin> = match self {
            ChannelSource::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|source| {
                    ChannelError::SourceUnavailable {
                        path: path.clone(),
                        source,
                    }
                })?;
                Box::new(BufReader::new(file))
            }
            ChannelSource::Inline(text) => Box::new(Cursor::new(text.clone().into_bytes())),
        };
        Ok(EventStream::new(reader, format.decoder()))
    }

    /// Short human-readable description.
    pub fn describe(&self) -> String {
        match self {
            ChannelSource::File(path) => path.display().to_string(),
            ChannelSource::Inline(text) => format!("<inline, {} lines>", text.lines().count()),
        }
    }
}

/// Decoded events pulled one line at a time.
///
/// Each read is a suspension point, so a slow source only delays its own
/// channel.
pub struct EventStream {
    reader: Box<dyn AsyncBufRead + Unpin>,
    decoder: Box<dyn LineDecoder>,
    line: Vec<u8>,
    line_no: usize,
    skipped: usize,
    exhausted: bool,
}

impl EventStream {
    pub fn new(reader: Box<dyn AsyncBufRead + Unpin>, decoder: Box<dyn LineDecoder>) -> Self {
        Self {
            reader,
            decoder,
            line: Vec::new(),
            line_no: 0,
            skipped: 0,
            exhausted: false,
        }
    }

    /// Lines rejected as malformed so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Next event in file order, or `None` at end of input.
    ///
    /// Malformed lines are skipped. Invalid UTF-8 is decoded lossily and
    /// then rejected like any other bad line.
    pub async fn next_event(&mut self) -> Result<Option<Event>, ChannelError> {
        while !self.exhausted {
            self.line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.line)
                .await
                .map_err(ChannelError::SourceRead)?;

            if read == 0 {
                self.exhausted = true;
                return Ok(self.decoder.finish());
            }
            self.line_no += 1;

            let text = String::from_utf8_lossy(&self.line);
            match self.decoder.decode(text.trim_end_matches(['\n', '\r'])) {
                Ok(Decoded::Event(event)) => return Ok(Some(event)),
                Ok(Decoded::Consumed) => {}
                Err(reason) => {
                    self.skipped += 1;
                    log::trace!("skipping line {}: {}", self.line_no, reason);
                }
            }
        }
        Ok(None)
    }
}
