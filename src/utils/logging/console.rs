//! Console output utilities
//!
//! This module provides the run summary printed by the command line tool.

use std::time::Duration;

use crate::quality::QualityReport;

/// Print the headline counts of a run and every metric failure
pub fn print_run_summary(report: &QualityReport, elapsed: Duration) {
    println!("Pipeline finished in {elapsed:?}");
    for name in [
        "patients_total",
        "patients_unique",
        "patients_duplicates",
        "patients_retained",
        "patients_excluded",
        "labs_outliers",
    ] {
        if let Some(value) = report.metric(name) {
            println!("  {name:<24} {value}");
        }
    }
    if !report.failures.is_empty() {
        println!("Metrics that could not be computed:");
        for failure in &report.failures {
            println!("  - {}: {}", failure.metric, failure.reason);
        }
    }
}
