//! Data processing modules.
//!
//! The extraction chain runs leaf-first: `classifier` → `extractor` →
//! `units` → `frequency` → `aggregator` → `pivot`, driven by `pipeline`.
//! `scaling` and `splitting` post-process a finished pivot table.

pub mod aggregator;
pub mod classifier;
pub mod extractor;
pub mod frequency;
pub mod pipeline;
pub mod pivot;
pub mod scaling;
pub mod splitting;
pub mod units;

// Re-export key types for convenience
pub use aggregator::{Aggregator, LoopReading};
pub use classifier::data_lines;
pub use extractor::{parse_record, RawRecord};
pub use frequency::{CanonicalFrequency, FrequencyIndex};
pub use pipeline::{run, Collector, FileStats, FileWarning, PipelineOutcome, Reading};
pub use pivot::{PivotRow, PivotTable};
pub use scaling::{scale_file, scale_table, ScalePreset, ScalingError};
pub use splitting::{split_file, split_table, SplittingError};
pub use units::{normalize, Unit};
