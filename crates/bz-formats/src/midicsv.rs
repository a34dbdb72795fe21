//! midicsv rows: `track, tick, record, ...`.
//!
//! Note changes are turned into back-to-back segments: each note-on,
//! note-off or end of track closes the segment that was sounding and emits
//! it as an event (a rest when nothing was sounding).
//!
//! Tick counts restart with every `Start_track`, so each track is its own
//! timeline and the tracks are played one after the other. Tempo and
//! resolution carry over from earlier tracks.

use arrayvec::ArrayVec;
use bz_ir::{note_to_frequency, ticks_to_seconds, Event, DEFAULT_TEMPO_US, DEFAULT_TICKS_PER_BEAT};

use crate::decoder::{Decoded, LineDecoder};
use crate::MalformedLine;

/// Most fields any record we act on carries.
const MAX_FIELDS: usize = 8;

/// Records that are valid midicsv but carry nothing we play.
const IGNORED_RECORDS: &[&str] = &[
    "End_of_file",
    "Title_t",
    "Text_t",
    "Copyright_t",
    "Instrument_name_t",
    "Marker_t",
    "Cue_point_t",
    "Lyric_t",
    "Time_signature",
    "Key_signature",
    "SMPTE_offset",
    "Sequence_number",
    "MIDI_port",
    "Channel_prefix",
    "Sequencer_specific",
    "Unknown_meta_event",
    "System_exclusive",
    "System_exclusive_packet",
    "Program_c",
    "Control_c",
    "Pitch_bend_c",
    "Poly_aftertouch_c",
    "Channel_aftertouch_c",
];

/// Stateful decoder for one track's midicsv rows.
#[derive(Clone, Debug)]
pub struct MidiCsvDecoder {
    ticks_per_beat: u32,
    tempo_us: u32,
    /// Frequency of the open segment (0 = rest)
    current: f32,
    /// Tick up to which `elapsed` has been accounted
    last_tick: u64,
    /// Seconds in the open segment so far
    elapsed: f64,
}

impl MidiCsvDecoder {
    pub fn new() -> Self {
        Self {
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            tempo_us: DEFAULT_TEMPO_US,
            current: 0.0,
            last_tick: 0,
            elapsed: 0.0,
        }
    }

    pub fn ticks_per_beat(&self) -> u32 {
        self.ticks_per_beat
    }

    pub fn tempo_us(&self) -> u32 {
        self.tempo_us
    }

    /// Account time up to `tick` at the current tempo.
    fn advance(&mut self, tick: u64) {
        let delta = tick.saturating_sub(self.last_tick);
        self.elapsed += ticks_to_seconds(delta, self.tempo_us, self.ticks_per_beat) as f64;
        self.last_tick = self.last_tick.max(tick);
    }

    /// Begin a fresh timeline at tick 0. Whatever is still open is dropped.
    fn restart(&mut self) {
        self.current = 0.0;
        self.last_tick = 0;
        self.elapsed = 0.0;
    }

    /// Close the open segment and start a new one at `frequency`.
    fn switch_to(&mut self, frequency: f32) -> Decoded {
        let closed = self.elapsed as f32;
        let previous = self.current;
        self.current = frequency;
        self.elapsed = 0.0;

        if closed > 0.0 {
            Decoded::Event(Event::new(previous, closed))
        } else {
            Decoded::Consumed
        }
    }

    fn silence_at(&mut self, tick: u64) -> Decoded {
        self.advance(tick);
        if self.current > 0.0 {
            self.switch_to(0.0)
        } else {
            Decoded::Consumed
        }
    }
}

impl Default for MidiCsvDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder for MidiCsvDecoder {
    fn decode(&mut self, line: &str) -> Result<Decoded, MalformedLine> {
        let mut fields = ArrayVec::<&str, MAX_FIELDS>::new();
        for field in line.split(',').take(MAX_FIELDS) {
            fields.push(field.trim());
        }
        require(&fields, 3)?;

        let tick: u64 = parse_field(&fields, 1)?;
        match fields[2] {
            "Header" => {
                require(&fields, 6)?;
                let division: u32 = parse_field(&fields, 5)?;
                if division == 0 {
                    return Err(MalformedLine::OutOfRange {
                        index: 5,
                        value: 0.0,
                    });
                }
                self.ticks_per_beat = division;
                Ok(Decoded::Consumed)
            }
            "Tempo" => {
                require(&fields, 4)?;
                let tempo: u32 = parse_field(&fields, 3)?;
                self.advance(tick);
                self.tempo_us = tempo;
                Ok(Decoded::Consumed)
            }
            "Note_on_c" => {
                require(&fields, 6)?;
                let note: u8 = parse_field(&fields, 4)?;
                let velocity: u8 = parse_field(&fields, 5)?;
                if note > 127 {
                    return Err(MalformedLine::OutOfRange {
                        index: 4,
                        value: note as f32,
                    });
                }
                if velocity == 0 {
                    return Ok(self.silence_at(tick));
                }
                self.advance(tick);
                Ok(self.switch_to(note_to_frequency(note)))
            }
            "Note_off_c" => {
                require(&fields, 6)?;
                Ok(self.silence_at(tick))
            }
            "Start_track" => {
                self.restart();
                Ok(Decoded::Consumed)
            }
            "End_track" => Ok(self.silence_at(tick)),
            record if IGNORED_RECORDS.contains(&record) => Ok(Decoded::Consumed),
            record => Err(MalformedLine::UnknownRecord(record.to_string())),
        }
    }
}

fn require(fields: &[&str], expected: usize) -> Result<(), MalformedLine> {
    if fields.len() < expected {
        Err(MalformedLine::FieldCount {
            expected,
            found: fields.len(),
        })
    } else {
        Ok(())
    }
}

fn parse_field<T: core::str::FromStr>(fields: &[&str], index: usize) -> Result<T, MalformedLine> {
    fields[index]
        .parse()
        .map_err(|_| MalformedLine::InvalidNumber {
            index,
            text: fields[index].to_string(),
        })
}
