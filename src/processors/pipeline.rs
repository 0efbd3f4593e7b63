//! End-to-end pipeline: instrument logs in, pivot table out.
//!
//! Extraction (section scan, record parsing, unit normalization) touches
//! only one file and runs on the rayon pool. Frequency matching and loop
//! accounting depend on arrival order, so extracted readings are fed to the
//! shared index strictly in selection order afterwards. The result is the
//! same as a fully sequential run.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::ExtractionConfig;
use crate::core::loaders::{describe_inputs, read_log_lines, FileDescriptor, LoaderError};

use super::aggregator::Aggregator;
use super::classifier::data_lines;
use super::extractor::parse_record;
use super::frequency::FrequencyIndex;
use super::pivot::PivotTable;
use super::units::normalize_record;

/// A normalized reading: frequency in kHz, primary and secondary in kohm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub frequency: f64,
    pub primary: f64,
    pub secondary: f64,
}

/// Parsing counters for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStats {
    pub section_found: bool,
    /// Candidate lines after the section header.
    pub data_lines: usize,
    /// Lines that produced a reading.
    pub records: usize,
    /// Lines dropped by the extractor or the unit policy.
    pub rejected: usize,
}

/// A selected file that could not be read.
#[derive(Debug, Clone)]
pub struct FileWarning {
    pub file: usize,
    pub path: PathBuf,
    pub message: String,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub files: Vec<FileDescriptor>,
    pub stats: Vec<FileStats>,
    pub warnings: Vec<FileWarning>,
    pub table: PivotTable,
}

/// Extract normalized readings from the lines of one file.
pub fn extract_lines<S: AsRef<str>>(
    lines: &[S],
    config: &ExtractionConfig,
) -> (Vec<Reading>, FileStats) {
    let marker = config.section_marker.as_str();
    let mut stats = FileStats {
        section_found: lines.iter().any(|l| l.as_ref().contains(marker)),
        ..FileStats::default()
    };
    let mut readings = Vec::new();

    for line in data_lines(lines.iter(), marker) {
        stats.data_lines += 1;
        let reading = parse_record(line.as_ref())
            .and_then(|record| normalize_record(&record, config.unit_policy));

        match reading {
            Some((frequency, primary, secondary)) => {
                stats.records += 1;
                readings.push(Reading {
                    frequency,
                    primary,
                    secondary,
                });
            }
            None => stats.rejected += 1,
        }
    }

    (readings, stats)
}

/// Read one file and extract its readings.
pub fn extract_file(
    path: &Path,
    config: &ExtractionConfig,
) -> Result<(Vec<Reading>, FileStats), LoaderError> {
    let lines = read_log_lines(path)?;
    Ok(extract_lines(&lines, config))
}

/// Shared frequency index and loop accounting across all files.
#[derive(Debug, Clone)]
pub struct Collector {
    files: Vec<FileDescriptor>,
    index: FrequencyIndex,
    aggregator: Aggregator,
}

impl Collector {
    pub fn new(files: Vec<FileDescriptor>, epsilon: f64) -> Self {
        let aggregator = Aggregator::new(files.len());
        Self {
            files,
            index: FrequencyIndex::new(epsilon),
            aggregator,
        }
    }

    /// Feed the readings of `file` in arrival order.
    pub fn ingest(&mut self, file: usize, readings: &[Reading]) {
        for r in readings {
            let slot = self.index.resolve(r.frequency);
            self.aggregator.record(file, slot, r.primary, r.secondary);
        }
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn index(&self) -> &FrequencyIndex {
        &self.index
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Assemble the pivot table from everything ingested so far.
    pub fn build(&self) -> PivotTable {
        PivotTable::build(&self.files, &self.index, &self.aggregator)
    }
}

/// Run the whole pipeline over `paths` in the given order.
///
/// Unreadable files are reported in [`PipelineOutcome::warnings`] and
/// contribute no columns; they never abort the run.
pub fn run(paths: &[PathBuf], config: &ExtractionConfig) -> PipelineOutcome {
    let files = describe_inputs(paths, config.max_label_len);

    let extracted: Vec<_> = if config.parallel {
        files
            .par_iter()
            .map(|f| extract_file(&f.path, config))
            .collect()
    } else {
        files
            .iter()
            .map(|f| extract_file(&f.path, config))
            .collect()
    };

    let mut collector = Collector::new(files, config.epsilon);
    let mut stats = Vec::with_capacity(extracted.len());
    let mut warnings = Vec::new();

    for (file, result) in extracted.into_iter().enumerate() {
        let label = &collector.files()[file].label;
        match result {
            Ok((readings, file_stats)) => {
                if !file_stats.section_found {
                    info!("{}: no {} section", label, config.section_marker);
                } else {
                    info!(
                        "{}: {} readings from {} data lines",
                        label, file_stats.records, file_stats.data_lines
                    );
                }
                if file_stats.rejected > 0 {
                    debug!("{}: skipped {} malformed lines", label, file_stats.rejected);
                }
                collector.ingest(file, &readings);
                stats.push(file_stats);
            }
            Err(e) => {
                warn!("Skipping {}: {}", label, e);
                warnings.push(FileWarning {
                    file,
                    path: collector.files()[file].path.clone(),
                    message: e.to_string(),
                });
                stats.push(FileStats::default());
            }
        }
    }

    let table = collector.build();
    debug!(
        "{} frequencies, {} data columns",
        table.rows.len(),
        table.num_data_columns()
    );

    PipelineOutcome {
        files: collector.files,
        stats,
        warnings,
        table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitPolicy;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str =
        "No. Loop Step Func Mode Judge Freq(kHz) Level(V) Range Primary Unit Secondary Unit";

    fn line(freq: f64, primary: &str, secondary: &str) -> String {
        format!("1 1 1 Z-Th SEQ PASS {freq} 1.000 AUTO {primary} {secondary}")
    }

    fn write_log(dir: &Path, name: &str, rows: &[String]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Instrument: LCR meter").unwrap();
        writeln!(file, "Date: 2024-01-01").unwrap();
        writeln!(file, "[List_Meas_Result]").unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        path
    }

    fn sequential() -> ExtractionConfig {
        ExtractionConfig {
            parallel: false,
            ..ExtractionConfig::default()
        }
    }

    #[test]
    fn test_extract_lines_counts() {
        let lines = vec![
            "preamble".to_string(),
            "List_Meas_Result".to_string(),
            HEADER.to_string(),
            line(1.0, "1 kohm", "2 kohm"),
            "garbage".to_string(),
            line(2.0, "1 uF", "2 kohm"),
        ];

        let (readings, stats) = extract_lines(&lines, &ExtractionConfig::default());

        assert!(stats.section_found);
        assert_eq!(stats.data_lines, 3);
        assert_eq!(stats.records, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(
            readings,
            vec![Reading {
                frequency: 1.0,
                primary: 1.0,
                secondary: 2.0
            }]
        );
    }

    #[test]
    fn test_extract_lines_lenient_policy() {
        let lines = vec![
            "List_Meas_Result".to_string(),
            HEADER.to_string(),
            line(2.0, "1 uF", "2 kohm"),
        ];
        let config = ExtractionConfig {
            unit_policy: UnitPolicy::Lenient,
            ..ExtractionConfig::default()
        };

        let (readings, _) = extract_lines(&lines, &config);
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn test_two_files_sparse_columns() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_log(
            temp_dir.path(),
            "A.txt",
            &[
                line(100.0, "1 kohm", "2 kohm"),
                line(100.0, "3 kohm", "4 kohm"),
            ],
        );
        let b = write_log(
            temp_dir.path(),
            "B.txt",
            &[
                line(200.0, "5 kohm", "6 kohm"),
                line(200.0, "7 kohm", "8 kohm"),
            ],
        );

        let outcome = run(&[a, b], &sequential());
        let text = outcome.table.to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Freq(kHz)\tPrimary_A_Loop1(kohm)\tSecondary_A_Loop1(kohm)\tPrimary_A_Loop2(kohm)\tSecondary_A_Loop2(kohm)\tPrimary_B_Loop1(kohm)\tSecondary_B_Loop1(kohm)\tPrimary_B_Loop2(kohm)\tSecondary_B_Loop2(kohm)"
        );
        assert_eq!(lines[1], "100.000\t1.000\t2.000\t3.000\t4.000\t\t\t\t");
        assert_eq!(lines[2], "200.000\t\t\t\t\t5.000\t6.000\t7.000\t8.000");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_megaohm_value_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_log(temp_dir.path(), "cell.txt", &[line(1.0, "2.5 Mohm", "-120 Ohm")]);

        let outcome = run(&[a], &sequential());
        assert_eq!(
            outcome.table.to_text().lines().nth(1),
            Some("1.000\t2500.000\t-0.120")
        );
    }

    #[test]
    fn test_noisy_frequencies_share_a_row() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_log(
            temp_dir.path(),
            "A.txt",
            &[
                line(99.9995, "1 kohm", "1 kohm"),
                line(100.0004, "2 kohm", "2 kohm"),
            ],
        );

        let outcome = run(&[a], &sequential());
        assert_eq!(outcome.table.rows.len(), 1);
        assert_eq!(outcome.table.rows[0].frequency, 99.9995);
        assert_eq!(outcome.table.columns.len(), 2);
    }

    #[test]
    fn test_noisy_frequencies_reverse_order_keep_first_seen() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_log(
            temp_dir.path(),
            "A.txt",
            &[
                line(100.0004, "1 kohm", "1 kohm"),
                line(99.9995, "2 kohm", "2 kohm"),
            ],
        );

        let outcome = run(&[a], &sequential());
        assert_eq!(outcome.table.rows.len(), 1);
        assert_eq!(outcome.table.rows[0].frequency, 100.0004);
        assert_eq!(
            outcome.table.to_text().lines().nth(1),
            Some("100.000\t1.000\t1.000\t2.000\t2.000")
        );
    }

    #[test]
    fn test_collector_ingests_in_arrival_order() {
        let files = describe_inputs(&[PathBuf::from("A.txt"), PathBuf::from("B.txt")], 127);
        let mut collector = Collector::new(files, 1e-3);
        let reading = |frequency: f64, primary: f64| Reading {
            frequency,
            primary,
            secondary: -primary,
        };

        collector.ingest(1, &[reading(5.0, 1.0), reading(5.0005, 2.0)]);
        collector.ingest(0, &[reading(7.0, 3.0)]);

        assert_eq!(collector.index().len(), 2);
        assert_eq!(collector.index().entries()[0].value, 5.0);
        assert_eq!(collector.aggregator().max_loops(0), 1);
        assert_eq!(collector.aggregator().max_loops(1), 2);
        assert_eq!(collector.aggregator().readings(1, 0)[1].primary, 2.0);
        assert_eq!(collector.build().columns.len(), 3);
    }

    #[test]
    fn test_loop_width_follows_each_files_own_max() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_log(
            temp_dir.path(),
            "A.txt",
            &[
                line(100.0, "1 kohm", "1 kohm"),
                line(100.0, "1 kohm", "1 kohm"),
            ],
        );
        let b = write_log(
            temp_dir.path(),
            "B.txt",
            &[
                line(5.0, "1 kohm", "1 kohm"),
                line(5.0, "1 kohm", "1 kohm"),
                line(5.0, "1 kohm", "1 kohm"),
            ],
        );

        let outcome = run(&[a, b], &sequential());
        let table = &outcome.table;

        assert_eq!(table.num_data_columns(), 2 * 2 + 2 * 3);
        let row_100 = table.rows.iter().find(|r| r.frequency == 100.0).unwrap();
        assert!(row_100.cells[2..].iter().all(Option::is_none));
    }

    #[test]
    fn test_unreadable_file_is_a_warning() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_log(temp_dir.path(), "A.txt", &[line(1.0, "1 kohm", "1 kohm")]);
        let missing = temp_dir.path().join("missing.txt");

        let outcome = run(&[missing.clone(), a], &sequential());

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].file, 0);
        assert_eq!(outcome.warnings[0].path, missing);
        assert_eq!(outcome.files.len(), 2);
        assert_eq!(outcome.table.columns.len(), 1);
        assert_eq!(outcome.table.columns[0].file, 1);
    }

    #[test]
    fn test_file_without_section_contributes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.txt");
        std::fs::write(&path, format!("{}\n", line(1.0, "1 kohm", "1 kohm"))).unwrap();

        let outcome = run(&[path], &sequential());

        assert!(!outcome.stats[0].section_found);
        assert!(outcome.table.rows.is_empty());
        assert_eq!(outcome.table.to_text(), "Freq(kHz)\n");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..6 {
            let rows: Vec<String> = (0..=i)
                .map(|k| line(10.0 * (k + 1) as f64 + 0.0001 * i as f64, "1 Mohm", "3 Ohm"))
                .collect();
            paths.push(write_log(temp_dir.path(), &format!("f{i}.txt"), &rows));
        }

        let parallel = run(&paths, &ExtractionConfig::default());
        let serial = run(&paths, &sequential());

        assert_eq!(parallel.table.to_text(), serial.table.to_text());
        assert_eq!(parallel.table, serial.table);
    }
}
