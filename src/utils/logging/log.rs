//! Logging utilities
//!
//! This module provides standardized logging functions for pipeline stages
//! and file operations.

use std::path::Path;
use std::time::Duration;

/// Log the start of a pipeline stage
///
/// # Arguments
/// * `stage` - Name of the stage, e.g. `"standardize"`
/// * `rows` - Number of input rows handed to the stage
pub fn log_stage_start(stage: &str, rows: usize) {
    log::info!("Stage {stage}: starting on {rows} rows");
}

/// Log the completion of a pipeline stage
///
/// # Arguments
/// * `stage` - Name of the stage
/// * `rows` - Number of output rows produced by the stage
/// * `elapsed` - Wall time spent in the stage
pub fn log_stage_complete(stage: &str, rows: usize, elapsed: Duration) {
    log::info!("Stage {stage}: produced {rows} rows in {elapsed:?}");
}

/// Log a file operation start with consistent format
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log a file operation completion with consistent format
///
/// # Arguments
/// * `operation` - Past-tense verb, e.g. `"read"` or `"wrote"`
/// * `path` - Path of the file that was operated on
/// * `items` - Number of rows processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, path: &Path, items: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(duration) => log::info!(
            "Successfully {operation} {items} rows ({}) in {duration:?}",
            path.display()
        ),
        None => log::info!("Successfully {operation} {items} rows ({})", path.display()),
    }
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}
