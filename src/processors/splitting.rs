//! Split a pivot table into one three-column file per loop.
//!
//! Each `Primary*` column that is directly followed by a `Secondary*` column
//! becomes `<out>/<safe name>.txt` with `Frequency`, `Primary` and
//! `Secondary` columns, ready for equivalent-circuit fitting tools.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;
use thiserror::Error;

use crate::core::loaders::{load_tsv_table, LoaderError, TsvTable};
use crate::core::writers::{write_tsv, WriteError};

/// Header of every split file.
pub const SPLIT_HEADER: [&str; 3] = ["Frequency", "Primary", "Secondary"];

/// Errors that can occur while splitting a table.
#[derive(Debug, Error)]
pub enum SplittingError {
    #[error("Failed to load table: {0}")]
    Load(#[from] LoaderError),

    #[error("Failed to write split file: {0}")]
    Write(#[from] WriteError),

    #[error("No frequency column in {0}")]
    NoFrequencyColumn(PathBuf),
}

/// One Primary/Secondary column pair found in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopColumns {
    pub primary: usize,
    pub secondary: usize,
    pub name: String,
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Replace every run of characters outside `[\w-]` with `_`.
pub fn safe_file_name(header: &str) -> String {
    static UNSAFE_RUN: OnceLock<Regex> = OnceLock::new();
    let pattern = UNSAFE_RUN.get_or_init(|| Regex::new(r"[^\w\-]+").expect("valid pattern"));
    pattern.replace_all(header, "_").into_owned()
}

/// Index of the first column whose name contains "freq", any case.
pub fn frequency_column(table: &TsvTable) -> Option<usize> {
    table.position(|h| h.to_ascii_lowercase().contains("freq"))
}

/// Primary columns that are immediately followed by a Secondary column.
pub fn loop_columns(table: &TsvTable) -> Vec<LoopColumns> {
    table
        .header
        .iter()
        .enumerate()
        .filter(|(_, h)| starts_with_ignore_case(h, "primary"))
        .filter_map(|(idx, h)| {
            let next = table.header.get(idx + 1)?;
            if !starts_with_ignore_case(next, "secondary") {
                debug!("{} has no Secondary partner, skipping", h);
                return None;
            }
            Some(LoopColumns {
                primary: idx,
                secondary: idx + 1,
                name: safe_file_name(h),
            })
        })
        .collect()
}

/// Write one file per loop column pair of `table` into `output_dir`.
///
/// Blank cells are kept so every file has one row per table row. Returns
/// the paths written, in column order.
pub fn split_table(
    table: &TsvTable,
    source: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, SplittingError> {
    let freq_idx = frequency_column(table)
        .ok_or_else(|| SplittingError::NoFrequencyColumn(source.to_path_buf()))?;

    let mut written = Vec::new();
    for pair in loop_columns(table) {
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                [freq_idx, pair.primary, pair.secondary]
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        let out_file = output_dir.join(format!("{}.txt", pair.name));
        write_tsv(&out_file, &SPLIT_HEADER, &rows)?;
        info!("Wrote {}", out_file.display());
        written.push(out_file);
    }

    Ok(written)
}

/// Load the pivot table at `input` and split it into `output_dir`.
pub fn split_file(input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, SplittingError> {
    let table = load_tsv_table(input)?;
    split_table(&table, input, output_dir)
}
