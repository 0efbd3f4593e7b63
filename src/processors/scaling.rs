//! Column scaling of a finished pivot table.
//!
//! Typical uses are converting kilohms to ohms (×1000) and flipping the
//! sign of reactance columns before plotting.

use std::path::Path;

use thiserror::Error;

use crate::config::ScalingConfig;
use crate::core::loaders::{load_tsv_table, LoaderError, TsvTable};
use crate::core::writers::{write_tsv, WriteError};

/// Errors that can occur while scaling a table.
#[derive(Debug, Error)]
pub enum ScalingError {
    #[error("Failed to load table: {0}")]
    Load(#[from] LoaderError),

    #[error("Failed to write table: {0}")]
    Write(#[from] WriteError),

    #[error("row {row}, column '{column}': '{value}' is not a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },
}

/// Named factor pairs for common conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScalePreset {
    /// Primary ×1000
    PrimaryKilo,
    /// Primary and Secondary ×1000
    BothKilo,
    /// Secondary ×-1
    NegateSecondary,
    /// Primary ×1000, Secondary ×-1000
    KiloNegate,
}

impl ScalePreset {
    pub fn factors(self) -> ScalingConfig {
        let (primary_factor, secondary_factor) = match self {
            ScalePreset::PrimaryKilo => (1000.0, 1.0),
            ScalePreset::BothKilo => (1000.0, 1000.0),
            ScalePreset::NegateSecondary => (1.0, -1.0),
            ScalePreset::KiloNegate => (1000.0, -1000.0),
        };
        ScalingConfig {
            primary_factor,
            secondary_factor,
        }
    }
}

/// Factor for a column, chosen by its header. `None` leaves it untouched.
fn column_factor(header: &str, factors: &ScalingConfig) -> Option<f64> {
    if header.contains("Primary") {
        Some(factors.primary_factor)
    } else if header.contains("Secondary") {
        Some(factors.secondary_factor)
    } else {
        None
    }
}

/// Multiply every `Primary*` and `Secondary*` column by its factor.
///
/// Blank cells stay blank. Scaled values are written in the shortest form
/// that parses back to the same number, so small factors keep every digit.
/// Other columns, including the frequency column, are copied unchanged.
pub fn scale_table(table: &TsvTable, factors: &ScalingConfig) -> Result<TsvTable, ScalingError> {
    let column_factors: Vec<Option<f64>> = table
        .header
        .iter()
        .map(|h| column_factor(h, factors))
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let mut scaled = Vec::with_capacity(row.len());
        for (col_idx, cell) in row.iter().enumerate() {
            let factor = column_factors.get(col_idx).copied().flatten();
            let trimmed = cell.trim();
            match factor {
                Some(factor) if !trimmed.is_empty() => {
                    let value: f64 = trimmed.parse().map_err(|_| ScalingError::NotNumeric {
                        row: row_idx,
                        column: table.header[col_idx].clone(),
                        value: cell.clone(),
                    })?;
                    scaled.push((value * factor).to_string());
                }
                _ => scaled.push(cell.clone()),
            }
        }
        rows.push(scaled);
    }

    Ok(TsvTable {
        header: table.header.clone(),
        rows,
    })
}

/// Scale the table at `input` and write it to `output`.
///
/// Returns the number of columns that were scaled.
pub fn scale_file(input: &Path, output: &Path, factors: &ScalingConfig) -> Result<usize, ScalingError> {
    let table = load_tsv_table(input)?;
    let scaled = scale_table(&table, factors)?;
    write_tsv(output, &scaled.header, &scaled.rows)?;

    Ok(table
        .header
        .iter()
        .filter(|h| column_factor(h, factors).is_some())
        .count())
}
