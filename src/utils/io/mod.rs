//! IO utilities for file operations
//!
//! This module provides the Parquet storage adapter for the four source
//! extracts and the writers for the gold tables and the quality report.

pub mod parquet;
pub mod report;

// Re-export commonly used functions for convenience
pub use self::parquet::{
    SchemaSample, load_sources, read_parquet, read_records, source_path, validate_directory,
    write_records,
};
pub use report::{OutputFiles, write_outputs, write_report_json};
