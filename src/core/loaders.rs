//! Input discovery and instrument log loading.
//!
//! This module provides:
//! - Display-label derivation from file paths
//! - The immutable per-file descriptor used to key columns
//! - Expansion of files/directories into an ordered input list
//! - Lossy line reading of instrument logs
//! - Reading back a tab-separated pivot table

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

/// Errors that can occur during input loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TSV parsing error: {0}")]
    Tsv(#[from] csv::Error),

    #[error("Empty table: {0}")]
    EmptyTable(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One selected input file. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// 0-based position in the selection.
    pub index: usize,
    /// Path as supplied by the caller.
    pub path: PathBuf,
    /// Basename without extension, bounded in length.
    pub label: String,
}

impl FileDescriptor {
    pub fn new(index: usize, path: impl Into<PathBuf>, max_label_len: usize) -> Self {
        let path = path.into();
        let label = derive_label(&path.to_string_lossy(), max_label_len);
        Self { index, path, label }
    }
}

/// Build descriptors for `paths` in selection order.
pub fn describe_inputs(paths: &[PathBuf], max_label_len: usize) -> Vec<FileDescriptor> {
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| FileDescriptor::new(i, p.clone(), max_label_len))
        .collect()
}

/// Derive a column label from a path string.
///
/// Both `/` and `\` count as separators so Windows paths label the same on
/// every platform. Everything from the last `.` of the basename is dropped,
/// and the result is cut to `max_len` characters.
pub fn derive_label(path: &str, max_len: usize) -> String {
    let base = path
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(path);
    let stem = match base.rfind('.') {
        Some(dot) => &base[..dot],
        None => base,
    };
    stem.chars().take(max_len).collect()
}

/// Expand the given paths into the ordered list of files to process.
///
/// Files are kept in the order given. A directory contributes its `.txt`
/// files (case-insensitive extension), sorted by path; one without any is
/// skipped with a warning so the other inputs still produce a table.
pub fn collect_input_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(inputs.len());

    for input in inputs {
        if input.is_dir() {
            let mut txt_files: Vec<PathBuf> = fs::read_dir(input)
                .map_err(|e| LoaderError::Read {
                    path: input.clone(),
                    source: e,
                })?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .map(|ext| ext.eq_ignore_ascii_case("txt"))
                            .unwrap_or(false)
                })
                .collect();

            if txt_files.is_empty() {
                log::warn!("No .txt files in {}, skipping", input.display());
                continue;
            }

            txt_files.sort();
            files.extend(txt_files);
        } else {
            // Missing files stay in place; the pipeline reports them.
            files.push(input.clone());
        }
    }

    Ok(files)
}

/// Read an instrument log as lines.
///
/// Instrument exports are not always valid UTF-8, so invalid bytes are
/// replaced instead of failing the whole file. Both `\n` and `\r\n` endings
/// are accepted.
pub fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| LoaderError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.lines().map(str::to_owned).collect())
}

/// A tab-separated table held as text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvTable {
    /// Column names, trimmed.
    pub header: Vec<String>,
    /// Data rows, each as wide as `header`.
    pub rows: Vec<Vec<String>>,
}

impl TsvTable {
    /// Index of the first column whose name satisfies `pred`.
    pub fn position(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.header.iter().position(|h| pred(h))
    }

    /// Cells of column `idx`, one per row.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(String::as_str).unwrap_or(""))
    }
}

/// Load a tab-separated table with a header row, such as a pivot table
/// written by the `extract` command.
///
/// Cells are taken literally (no quote handling) so blank cells stay blank.
pub fn load_tsv_table(path: &Path) -> Result<TsvTable> {
    let file = File::open(path).map_err(|e| LoaderError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .from_reader(BufReader::new(file));

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if header.iter().all(String::is_empty) {
        return Err(LoaderError::EmptyTable(path.to_path_buf()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    Ok(TsvTable { header, rows })
}
