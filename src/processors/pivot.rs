//! Sparse-to-dense pivot table assembly and rendering.

use std::fmt::Write as _;

use crate::config::CANONICAL_UNIT;
use crate::core::loaders::FileDescriptor;

use super::aggregator::{Aggregator, LoopReading};
use super::frequency::FrequencyIndex;

/// Header of the frequency column.
pub const FREQUENCY_HEADER: &str = "Freq(kHz)";

/// Cell separator of the rendered table.
pub const DELIMITER: &str = "\t";

/// One (file, loop) column pair of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub file: usize,
    /// 0-based loop index; headers show it 1-based.
    pub loop_index: usize,
    pub primary_header: String,
    pub secondary_header: String,
}

impl ColumnGroup {
    fn new(file: &FileDescriptor, loop_index: usize) -> Self {
        let n = loop_index + 1;
        Self {
            file: file.index,
            loop_index,
            primary_header: format!("Primary_{}_Loop{}({})", file.label, n, CANONICAL_UNIT),
            secondary_header: format!("Secondary_{}_Loop{}({})", file.label, n, CANONICAL_UNIT),
        }
    }
}

/// One output row: a canonical frequency and one optional reading per
/// column group.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub frequency: f64,
    pub cells: Vec<Option<LoopReading>>,
}

/// The dense frequency × (file, loop) grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub columns: Vec<ColumnGroup>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    /// Assemble the table from everything accumulated during parsing.
    ///
    /// Columns follow file selection order, then loop order; each file gets
    /// exactly `max_loops` groups. Rows are canonical frequencies in
    /// ascending order. A cell is filled only if that loop was recorded for
    /// that file at that frequency.
    pub fn build(files: &[FileDescriptor], index: &FrequencyIndex, aggregator: &Aggregator) -> Self {
        let columns: Vec<ColumnGroup> = files
            .iter()
            .flat_map(|file| {
                (0..aggregator.max_loops(file.index)).map(move |l| ColumnGroup::new(file, l))
            })
            .collect();

        let rows = index
            .sorted()
            .into_iter()
            .map(|freq| PivotRow {
                frequency: freq.value,
                cells: columns
                    .iter()
                    .map(|col| {
                        aggregator
                            .readings(col.file, freq.slot)
                            .get(col.loop_index)
                            .copied()
                    })
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    /// Number of value columns, excluding the frequency column.
    pub fn num_data_columns(&self) -> usize {
        self.columns.len() * 2
    }

    /// Header cells, frequency column first.
    pub fn header(&self) -> Vec<&str> {
        std::iter::once(FREQUENCY_HEADER)
            .chain(self.columns.iter().flat_map(|c| {
                [c.primary_header.as_str(), c.secondary_header.as_str()]
            }))
            .collect()
    }

    /// Render as tab-separated text with a trailing newline on every row.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(64 * (self.rows.len() + 1));

        out.push_str(&self.header().join(DELIMITER));
        out.push('\n');

        for row in &self.rows {
            push_value(&mut out, row.frequency);
            for cell in &row.cells {
                match cell {
                    Some(r) => {
                        out.push_str(DELIMITER);
                        push_value(&mut out, r.primary);
                        out.push_str(DELIMITER);
                        push_value(&mut out, r.secondary);
                    }
                    None => {
                        out.push_str(DELIMITER);
                        out.push_str(DELIMITER);
                    }
                }
            }
            out.push('\n');
        }

        out
    }
}

/// Append `value` with three decimals. Non-finite values use the C
/// spellings `nan`, `-nan`, `inf` and `-inf`.
fn push_value(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str(if value.is_sign_negative() { "-nan" } else { "nan" });
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
    } else {
        // Writing into a String cannot fail.
        let _ = write!(out, "{value:.3}");
    }
}
