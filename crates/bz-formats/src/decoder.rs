//! Line decoder trait and format selection.

use core::fmt;
use core::str::FromStr;

use bz_ir::Event;

use crate::midicsv::MidiCsvDecoder;
use crate::pairs::PairDecoder;
use crate::MalformedLine;

/// Result of feeding one well-formed line to a decoder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decoded {
    /// The line completed an event
    Event(Event),
    /// The line was understood but produced no event yet
    Consumed,
}

/// Turns a channel file into events one line at a time.
pub trait LineDecoder {
    /// Decode one line (without its terminator).
    fn decode(&mut self, line: &str) -> Result<Decoded, MalformedLine>;

    /// Flush any event still pending at end of input.
    fn finish(&mut self) -> Option<Event> {
        None
    }
}

/// Channel file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum EventFormat {
    /// `<frequency>,<duration>` per line
    #[default]
    Pairs,
    /// midicsv rows (`track, tick, Note_on_c, channel, note, velocity`)
    MidiCsv,
}

impl EventFormat {
    /// Create a fresh decoder for this format.
    pub fn decoder(self) -> Box<dyn LineDecoder> {
        match self {
            EventFormat::Pairs => Box::new(PairDecoder),
            EventFormat::MidiCsv => Box::new(MidiCsvDecoder::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventFormat::Pairs => "pairs",
            EventFormat::MidiCsv => "midi-csv",
        }
    }
}

impl fmt::Display for EventFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format name that matches no [`EventFormat`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown event format {0:?} (expected \"pairs\" or \"midi-csv\")")]
pub struct UnknownFormat(pub String);

impl FromStr for EventFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pairs" | "csv" => Ok(EventFormat::Pairs),
            "midi-csv" | "midicsv" => Ok(EventFormat::MidiCsv),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Decode a whole in-memory file, returning the events and the number of
/// skipped lines.
pub fn decode_str(text: &str, format: EventFormat) -> (Vec<Event>, usize) {
    let mut decoder = format.decoder();
    let mut events = Vec::new();
    let mut skipped = 0;

    for line in text.lines() {
        match decoder.decode(line) {
            Ok(Decoded::Event(event)) => events.push(event),
            Ok(Decoded::Consumed) => {}
            Err(_) => skipped += 1,
        }
    }
    events.extend(decoder.finish());

    (events, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_round_trip() {
        for format in [EventFormat::Pairs, EventFormat::MidiCsv] {
            assert_eq!(format.name().parse::<EventFormat>(), Ok(format));
        }
        assert!("wav".parse::<EventFormat>().is_err());
    }

    #[test]
    fn decode_str_skips_and_counts_malformed_lines() {
        let text = "frequency,duration\n440.0,0.5\n\ngarbage\n0,0.25\n880.0,0.3\n";
        let (events, skipped) = decode_str(text, EventFormat::Pairs);
        assert_eq!(
            events,
            vec![
                Event::new(440.0, 0.5),
                Event::rest(0.25),
                Event::new(880.0, 0.3)
            ]
        );
        assert_eq!(skipped, 3);
    }
}
