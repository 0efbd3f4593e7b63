//! Fixed-layout record extraction from measurement lines.
//!
//! A measurement line is split on whitespace and its tokens are mapped by
//! position:
//!
//! ```text
//!  0   1   2   3    4    5    6     7     8    9       10     11      12
//!  No  Lp  St  txt  txt  txt  Freq  aux   txt  Primary unit1  Second  unit2
//! ```
//!
//! Positions 0-2 must be integers and 6, 7, 9, 11 must be numbers. Text
//! positions accept any token. Tokens past position 12 are ignored.

/// Number of tokens a measurement line must carry.
pub const RECORD_WIDTH: usize = 13;

const COUNTER_FIELDS: [usize; 3] = [0, 1, 2];
const FREQUENCY: usize = 6;
const AUX_VALUE: usize = 7;
const PRIMARY_VALUE: usize = 9;
const PRIMARY_UNIT: usize = 10;
const SECONDARY_VALUE: usize = 11;
const SECONDARY_UNIT: usize = 12;

/// One parsed measurement line, before unit normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord<'a> {
    /// Test frequency in kHz.
    pub frequency: f64,
    pub primary: f64,
    pub primary_unit: &'a str,
    pub secondary: f64,
    pub secondary_unit: &'a str,
}

/// Parse one candidate data line.
///
/// Returns `None` when the line does not match the layout exactly; no
/// partial record is ever produced.
pub fn parse_record(line: &str) -> Option<RawRecord<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().take(RECORD_WIDTH).collect();
    if tokens.len() < RECORD_WIDTH {
        return None;
    }

    for idx in COUNTER_FIELDS {
        tokens[idx].parse::<i64>().ok()?;
    }
    tokens[AUX_VALUE].parse::<f64>().ok()?;

    Some(RawRecord {
        frequency: tokens[FREQUENCY].parse().ok()?,
        primary: tokens[PRIMARY_VALUE].parse().ok()?,
        primary_unit: tokens[PRIMARY_UNIT],
        secondary: tokens[SECONDARY_VALUE].parse().ok()?,
        secondary_unit: tokens[SECONDARY_UNIT],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "1 1 1 Z-Th Seq Pass 100.0 1.0 V 2.5 Mohm -45.2 kohm";

    #[test]
    fn test_parse_well_formed_line() {
        let record = parse_record(GOOD).unwrap();
        assert_eq!(record.frequency, 100.0);
        assert_eq!(record.primary, 2.5);
        assert_eq!(record.primary_unit, "Mohm");
        assert_eq!(record.secondary, -45.2);
        assert_eq!(record.secondary_unit, "kohm");
    }

    #[test]
    fn test_tabs_and_trailing_tokens_accepted() {
        let line = "3\t2\t1\ta\tb\tc\t0.5\t0\tx\t12\tOhm\t7e1\tOhm\textra tokens";
        let record = parse_record(line).unwrap();
        assert_eq!(record.frequency, 0.5);
        assert_eq!(record.primary, 12.0);
        assert_eq!(record.secondary, 70.0);
    }

    #[test]
    fn test_short_line_rejected() {
        assert!(parse_record("1 1 1 Z-Th Seq Pass 100.0 1.0 V 2.5 Mohm -45.2").is_none());
        assert!(parse_record("").is_none());
    }

    #[test]
    fn test_non_integer_counter_rejected() {
        let line = "1 x 1 Z-Th Seq Pass 100.0 1.0 V 2.5 Mohm -45.2 kohm";
        assert!(parse_record(line).is_none());
        let line = "1 1.5 1 Z-Th Seq Pass 100.0 1.0 V 2.5 Mohm -45.2 kohm";
        assert!(parse_record(line).is_none());
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let freq = "1 1 1 Z-Th Seq Pass kHz 1.0 V 2.5 Mohm -45.2 kohm";
        let aux = "1 1 1 Z-Th Seq Pass 100.0 n/a V 2.5 Mohm -45.2 kohm";
        let primary = "1 1 1 Z-Th Seq Pass 100.0 1.0 V ---- Mohm -45.2 kohm";
        let secondary = "1 1 1 Z-Th Seq Pass 100.0 1.0 V 2.5 Mohm ---- kohm";
        for line in [freq, aux, primary, secondary] {
            assert!(parse_record(line).is_none(), "accepted: {line}");
        }
    }

    #[test]
    fn test_header_line_rejected() {
        let header = "No. Loop Step Func Mode Judge Freq(kHz) Level(V) Range Primary Unit Secondary Unit";
        assert!(parse_record(header).is_none());
    }
}
