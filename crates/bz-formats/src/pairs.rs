//! `<frequency>,<duration>` lines.

use arrayvec::ArrayVec;
use bz_ir::Event;

use crate::decoder::{Decoded, LineDecoder};
use crate::MalformedLine;

/// Parse one `<frequency>,<duration>` line.
///
/// Surrounding whitespace on each field is ignored. The frequency must be a
/// finite value `>= 0`, the duration a finite value `> 0`. Anything else,
/// including a header row or a blank line, is malformed.
pub fn parse_line(line: &str) -> Result<Event, MalformedLine> {
    let mut fields = ArrayVec::<&str, 2>::new();
    for field in line.split(',') {
        if fields.try_push(field.trim()).is_err() {
            return Err(MalformedLine::FieldCount {
                expected: 2,
                found: line.split(',').count(),
            });
        }
    }
    if fields.len() != 2 {
        return Err(MalformedLine::FieldCount {
            expected: 2,
            found: fields.len(),
        });
    }

    let frequency = parse_number(fields[0], 0)?;
    let duration = parse_number(fields[1], 1)?;

    if frequency < 0.0 {
        return Err(MalformedLine::OutOfRange {
            index: 0,
            value: frequency,
        });
    }
    if duration <= 0.0 {
        return Err(MalformedLine::OutOfRange {
            index: 1,
            value: duration,
        });
    }

    Ok(Event::new(frequency, duration))
}

fn parse_number(text: &str, index: usize) -> Result<f32, MalformedLine> {
    match text.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MalformedLine::InvalidNumber {
            index,
            text: text.to_string(),
        }),
    }
}

/// Stateless decoder for frequency/duration pair files.
#[derive(Clone, Copy, Debug, Default)]
pub struct PairDecoder;

impl LineDecoder for PairDecoder {
    fn decode(&mut self, line: &str) -> Result<Decoded, MalformedLine> {
        parse_line(line).map(Decoded::Event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tone_and_rest() {
        assert_eq!(parse_line("440.0,0.5"), Ok(Event::new(440.0, 0.5)));
        assert_eq!(parse_line("0,0.25"), Ok(Event::rest(0.25)));
        assert_eq!(parse_line(" 880 , 0.3 \r"), Ok(Event::new(880.0, 0.3)));
    }

    #[test]
    fn header_row_is_malformed() {
        assert!(matches!(
            parse_line("frequency,duration"),
            Err(MalformedLine::InvalidNumber { index: 0, .. })
        ));
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        assert_eq!(
            parse_line(""),
            Err(MalformedLine::FieldCount { expected: 2, found: 1 })
        );
        assert_eq!(
            parse_line("440"),
            Err(MalformedLine::FieldCount { expected: 2, found: 1 })
        );
        assert_eq!(
            parse_line("440,0.5,1,2"),
            Err(MalformedLine::FieldCount { expected: 2, found: 4 })
        );
        assert!(parse_line("440,0.5,").is_err());
    }

    #[test]
    fn out_of_range_values_are_malformed() {
        assert!(matches!(
            parse_line("-1,0.5"),
            Err(MalformedLine::OutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            parse_line("440,0"),
            Err(MalformedLine::OutOfRange { index: 1, .. })
        ));
        assert!(matches!(
            parse_line("440,-0.5"),
            Err(MalformedLine::OutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn non_finite_values_are_malformed() {
        assert!(parse_line("inf,0.5").is_err());
        assert!(parse_line("440,NaN").is_err());
        assert!(parse_line("abc,0.5").is_err());
    }

    #[test]
    fn accepts_every_valid_shape_exactly() {
        for (f, d) in [(0.0f32, 0.001f32), (27.5, 4.0), (440.0, 0.5), (4186.01, 0.125)] {
            let line = format!("{},{}", f, d);
            assert_eq!(parse_line(&line), Ok(Event::new(f, d)), "line {:?}", line);
        }
    }
}
