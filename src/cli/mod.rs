//! Command-line interface for the impedance pivot tools.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{PipelineConfig, ScalingConfig, UnitPolicy};
use crate::core::{collect_input_paths, write_table_text};
use crate::processors::ScalePreset;

#[derive(Parser)]
#[command(name = "impedance-pivot")]
#[command(about = "Collect impedance sweeps from instrument logs into a pivot table", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the frequency pivot table from instrument logs
    Extract {
        /// Log files, or directories of .txt logs, in column order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Also write the table to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Frequency-match tolerance in kHz
        #[arg(long)]
        epsilon: Option<f64>,
        /// Treat unknown unit tags as kohm instead of dropping the record
        #[arg(long)]
        lenient_units: bool,
        /// Parse files one after another
        #[arg(long)]
        sequential: bool,
        /// Do not echo the table to stdout
        #[arg(short, long)]
        quiet: bool,
    },

    /// Multiply Primary/Secondary columns of a pivot table
    Scale {
        /// Pivot table written by `extract`
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Named factor pair
        #[arg(long, value_enum, conflicts_with_all = ["primary_factor", "secondary_factor"])]
        preset: Option<ScalePreset>,
        /// Factor for Primary columns
        #[arg(long, allow_negative_numbers = true)]
        primary_factor: Option<f64>,
        /// Factor for Secondary columns
        #[arg(long, allow_negative_numbers = true)]
        secondary_factor: Option<f64>,
    },

    /// Write one Frequency/Primary/Secondary file per loop column
    Split {
        /// Pivot table written by `extract`
        input: PathBuf,
        /// Output directory (defaults to `<input stem>_loops` next to the input)
        output_dir: Option<PathBuf>,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box to stderr, keeping stdout for the table itself
fn print_summary(title: &str, items: &[(&str, String)]) {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║ {:<60} ║", title);
    eprintln!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            let head: String = value.chars().take(36).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        eprintln!("║ {:<20}: {:<37} ║", key, display_value);
    }
    eprintln!("╚══════════════════════════════════════════════════════════════╝");
    eprintln!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    let result = match cli.command {
        Commands::Extract {
            inputs,
            output,
            epsilon,
            lenient_units,
            sequential,
            quiet,
        } => cmd_extract(&inputs, output.as_deref(), epsilon, lenient_units, sequential, quiet, config),
        Commands::Scale {
            input,
            output,
            preset,
            primary_factor,
            secondary_factor,
        } => cmd_scale(&input, &output, preset, primary_factor, secondary_factor, &config),
        Commands::Split { input, output_dir } => cmd_split(&input, output_dir),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn cmd_extract(
    inputs: &[PathBuf],
    output: Option<&Path>,
    epsilon: Option<f64>,
    lenient_units: bool,
    sequential: bool,
    quiet: bool,
    mut config: PipelineConfig,
) -> Result<()> {
    use crate::processors::pipeline;

    let start = Instant::now();

    // CLI flags win over the config file
    if let Some(eps) = epsilon {
        config.extraction.epsilon = eps;
    }
    if lenient_units {
        config.extraction.unit_policy = UnitPolicy::Lenient;
    }
    if sequential {
        config.extraction.parallel = false;
    }
    if let Err(msg) = config.validate() {
        bail!("invalid configuration: {msg}");
    }

    let paths = collect_input_paths(inputs).context("collecting input files")?;
    info!("Processing {} input files", paths.len());

    let spinner = create_spinner("Parsing instrument logs...");
    let outcome = pipeline::run(&paths, &config.extraction);
    spinner.finish_and_clear();

    let text = outcome.table.to_text();

    if !quiet {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(text.as_bytes())
            .and_then(|_| lock.flush())
            .context("writing table to stdout")?;
    }

    if let Some(path) = output {
        write_table_text(path, &text)
            .with_context(|| format!("saving table to {}", path.display()))?;
    }

    let readings: usize = outcome.stats.iter().map(|s| s.records).sum();
    let rejected: usize = outcome.stats.iter().map(|s| s.rejected).sum();

    print_summary(
        "Extraction Complete",
        &[
            ("Input files", outcome.files.len().to_string()),
            ("Unreadable files", outcome.warnings.len().to_string()),
            ("Readings", readings.to_string()),
            ("Skipped lines", rejected.to_string()),
            ("Frequencies", outcome.table.rows.len().to_string()),
            ("Data columns", outcome.table.num_data_columns().to_string()),
            (
                "Output file",
                output.map_or_else(|| "-".to_string(), |p| p.display().to_string()),
            ),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_scale(
    input: &Path,
    output: &Path,
    preset: Option<ScalePreset>,
    primary_factor: Option<f64>,
    secondary_factor: Option<f64>,
    config: &PipelineConfig,
) -> Result<()> {
    use crate::processors::scaling;

    let start = Instant::now();

    let factors = match preset {
        Some(p) => p.factors(),
        None => ScalingConfig {
            primary_factor: primary_factor.unwrap_or(config.scaling.primary_factor),
            secondary_factor: secondary_factor.unwrap_or(config.scaling.secondary_factor),
        },
    };

    let columns = scaling::scale_file(input, output, &factors)
        .with_context(|| format!("scaling {}", input.display()))?;

    print_summary(
        "Scaling Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output file", output.display().to_string()),
            ("Primary factor", factors.primary_factor.to_string()),
            ("Secondary factor", factors.secondary_factor.to_string()),
            ("Columns scaled", columns.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn default_split_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "pivot".to_string());
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_loops"))
}

fn cmd_split(input: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    use crate::processors::splitting;

    let start = Instant::now();

    let effective_output_dir = output_dir.unwrap_or_else(|| default_split_dir(input));

    let written = splitting::split_file(input, &effective_output_dir)
        .with_context(|| format!("splitting {}", input.display()))?;

    if written.is_empty() {
        warn!("No Primary/Secondary column pairs in {}", input.display());
    }

    print_summary(
        "Split Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output directory", effective_output_dir.display().to_string()),
            ("Files written", written.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}
