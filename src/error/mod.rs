//! Error handling for the readmission pipeline.
//!
//! Two kinds of failure exist. [`PipelineError`] is structural and fatal: a
//! required source is missing, a file cannot be read, a configuration cannot be
//! parsed. [`IssueKind`] names the local, recoverable data conditions that never
//! abort a run and are only counted in the quality report.

use std::{fmt, io};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use serde::{Deserialize, Serialize};

/// The four source extracts the pipeline requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Patient demographics and admissions
    Patients,
    /// Diagnosis codes per patient
    Diagnoses,
    /// Laboratory measurements
    LabResults,
    /// Medication orders
    Medications,
}

impl SourceKind {
    /// All sources in ingestion order
    pub const ALL: [Self; 4] = [
        Self::Patients,
        Self::Diagnoses,
        Self::LabResults,
        Self::Medications,
    ];

    /// Table name, also used as the file stem by the storage adapter
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Diagnoses => "diagnoses",
            Self::LabResults => "lab_results",
            Self::Medications => "medications",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Fatal errors that stop a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required source table was not supplied
    #[error("Required source table '{0}' is missing; no stage was executed")]
    MissingSource(SourceKind),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error building or reading Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error converting between records and Arrow batches
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error writing the JSON report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl From<serde_arrow::Error> for PipelineError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(error: toml::de::Error) -> Self {
        Self::Config(error.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Recoverable data conditions surfaced through the quality report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A date or value could not be interpreted; the field is null and flagged
    ParseFailure,
    /// A value was not found in a canonicalization table and passed through
    StandardizationMiss,
    /// Not enough demographics to cluster the patient reliably
    IncompleteIdentity,
    /// A patient failed the completeness gate and was excluded
    CompletenessGateFailure,
    /// A lab group was too small for the IQR rule; detection was skipped
    InsufficientSampleForOutlierTest,
}

impl IssueKind {
    /// All issue kinds in reporting order
    pub const ALL: [Self; 5] = [
        Self::ParseFailure,
        Self::StandardizationMiss,
        Self::IncompleteIdentity,
        Self::CompletenessGateFailure,
        Self::InsufficientSampleForOutlierTest,
    ];

    /// Name of the quality metric counting this issue
    #[must_use]
    pub const fn metric_name(self) -> &'static str {
        match self {
            Self::ParseFailure => "issues_parse_failure",
            Self::StandardizationMiss => "issues_standardization_miss",
            Self::IncompleteIdentity => "issues_incomplete_identity",
            Self::CompletenessGateFailure => "issues_completeness_gate_failure",
            Self::InsufficientSampleForOutlierTest => "issues_insufficient_sample",
        }
    }
}
