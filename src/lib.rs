//! Impedance sweep collection from instrument logs.
//!
//! This crate provides tools for:
//! - Locating the `List_Meas_Result` section of LCR-meter logs
//! - Parsing fixed-layout measurement lines and normalizing units to kohm
//! - Merging noisy test frequencies and counting repeated loops per file
//! - Building a tab-separated frequency × (file, loop) pivot table
//! - Scaling and splitting finished pivot tables
//!
//! # Example
//!
//! ```no_run
//! use impedance_pivot::{config::ExtractionConfig, processors::pipeline};
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("run1.txt"), PathBuf::from("run2.txt")];
//! let outcome = pipeline::run(&paths, &ExtractionConfig::default());
//! print!("{}", outcome.table.to_text());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{ExtractionConfig, PipelineConfig, ScalingConfig, UnitPolicy};
pub use core::loaders::FileDescriptor;
pub use processors::pivot::PivotTable;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
