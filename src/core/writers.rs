//! Output writers for pivot tables and derived TSV files.
//!
//! - Plain text sink for the rendered pivot table
//! - Tab-separated writer (via `csv`) for scaled and per-loop tables

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TSV writing error.
    #[error("TSV write error for '{path}': {source}")]
    TsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A row does not have as many cells as the header.
    #[error("row {row} has {found} cells, header has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
pub(crate) fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Write already-rendered table text verbatim.
///
/// # Errors
///
/// Returns an error if parent directories or the file cannot be created,
/// or if writing fails.
pub fn write_table_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;
    let path_str = path.display().to_string();

    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| WriteError::WriteFile {
            path: path_str,
            source: e,
        })?;

    Ok(())
}

/// Write a header and rows as tab-separated values.
///
/// Cells are never quoted and every row ends with `\n`, matching the
/// layout of the pivot table itself.
///
/// # Errors
///
/// Returns an error if any row is narrower or wider than the header, or if
/// the file cannot be created or written.
pub fn write_tsv<S: AsRef<str>>(path: &Path, header: &[S], rows: &[Vec<String>]) -> Result<()> {
    if let Some((row, cells)) = rows
        .iter()
        .enumerate()
        .find(|(_, cells)| cells.len() != header.len())
    {
        return Err(WriteError::RowWidth {
            row,
            expected: header.len(),
            found: cells.len(),
        });
    }

    ensure_parent_dirs(path)?;
    let buf_writer = create_buffered_writer(path)?;
    let mut tsv_writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf_writer);

    let path_str = path.display().to_string();

    tsv_writer
        .write_record(header.iter().map(|h| h.as_ref()))
        .map_err(|e| WriteError::TsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for cells in rows {
        tsv_writer
            .write_record(cells)
            .map_err(|e| WriteError::TsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    tsv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}
