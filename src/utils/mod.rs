//! Utility functions for file IO, logging and progress reporting

pub mod io;
pub mod logging;

pub use io::{load_sources, write_outputs};
