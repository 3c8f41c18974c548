//! Bronze-layer records
//!
//! Raw rows exactly as they arrive from the four extracts. Field names follow
//! the extract headers; `id` is accepted as an alias for each primary key.
//! Everything except the identifiers is optional because the extracts are
//! not trusted to be complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the patients extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPatient {
    #[serde(alias = "id")]
    pub patient_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub admission_date: Option<String>,
    pub discharge_date: Option<String>,
    #[serde(default)]
    pub length_of_stay: Option<i32>,
    pub readmitted_30_days: Option<i32>,
}

/// One row of the diagnoses extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDiagnosis {
    #[serde(alias = "id")]
    pub diagnosis_id: i64,
    pub patient_id: i64,
    pub diagnosis_code: Option<String>,
    #[serde(default)]
    pub diagnosis_description: Option<String>,
    #[serde(alias = "primary_diagnosis_flag")]
    pub primary_diagnosis: Option<i32>,
}

/// One row of the lab results extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLabResult {
    #[serde(alias = "id")]
    pub lab_id: i64,
    pub patient_id: i64,
    pub test_name: Option<String>,
    pub test_value: Option<f64>,
    pub test_date: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
}

/// One row of the medications extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMedication {
    #[serde(alias = "id")]
    pub medication_id: i64,
    pub patient_id: i64,
    pub medication_name: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Where and when a raw row entered the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Time the ingestion adapter accepted the row
    pub ingest_timestamp: DateTime<Utc>,
    /// Name of the extract the row came from
    pub source_file: String,
}

/// An immutable raw row together with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord<T> {
    record: T,
    provenance: Provenance,
}

impl<T> RawRecord<T> {
    /// Wrap a raw row with its provenance
    #[must_use]
    pub const fn new(record: T, provenance: Provenance) -> Self {
        Self { record, provenance }
    }

    /// The original row, unchanged
    #[must_use]
    pub const fn record(&self) -> &T {
        &self.record
    }

    /// Ingestion metadata
    #[must_use]
    pub const fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}

/// A raw source table as handed to the ingestion adapter
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable<T> {
    /// Name of the extract, recorded as `source_file` on every row
    pub source_file: String,
    /// Rows in extract order
    pub rows: Vec<T>,
}

impl<T> SourceTable<T> {
    /// Create a source table
    #[must_use]
    pub fn new(source_file: impl Into<String>, rows: Vec<T>) -> Self {
        Self {
            source_file: source_file.into(),
            rows,
        }
    }
}

/// The four raw inputs; a `None` entry is a missing source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTables {
    pub patients: Option<SourceTable<RawPatient>>,
    pub diagnoses: Option<SourceTable<RawDiagnosis>>,
    pub lab_results: Option<SourceTable<RawLabResult>>,
    pub medications: Option<SourceTable<RawMedication>>,
}

/// Bronze layer: every raw row with provenance, one table per source
#[derive(Debug, Clone, PartialEq)]
pub struct BronzeTables {
    pub patients: Vec<RawRecord<RawPatient>>,
    pub diagnoses: Vec<RawRecord<RawDiagnosis>>,
    pub lab_results: Vec<RawRecord<RawLabResult>>,
    pub medications: Vec<RawRecord<RawMedication>>,
}
