//! Core data types and I/O operations.

pub mod loaders;
pub mod writers;

pub use loaders::{
    collect_input_paths, derive_label, load_tsv_table, read_log_lines, FileDescriptor, LoaderError,
    TsvTable,
};
pub use writers::{write_table_text, write_tsv, WriteError};
