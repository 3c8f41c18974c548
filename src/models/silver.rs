//! Silver-layer records
//!
//! Standardized, deduplicated and annotated rows. Each record keeps the raw
//! value of every normalized column next to its standardized form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::field::StandardizedField;
use super::types::{Gender, LabTest, PatientKey};

/// A patient row after field standardization, before identity resolution
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedPatient {
    pub patient_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: StandardizedField<NaiveDate>,
    /// Age as reported by the extract
    pub reported_age: Option<i32>,
    pub gender: Gender,
    pub admission_date: StandardizedField<NaiveDate>,
    pub discharge_date: StandardizedField<NaiveDate>,
    /// Length of stay as reported by the extract; features use the dates
    pub reported_length_of_stay: Option<i32>,
    pub readmitted_30_days: Option<i32>,
}

impl StandardizedPatient {
    /// Length of stay in days, if both admission and discharge dates parsed
    #[must_use]
    pub fn length_of_stay(&self) -> Option<i64> {
        match (self.admission_date.get(), self.discharge_date.get()) {
            (Some(admission), Some(discharge)) => Some((discharge - admission).num_days()),
            _ => None,
        }
    }
}

/// A patient row with its resolved identity
#[derive(Debug, Clone, PartialEq)]
pub struct SilverPatient {
    /// Key of the identity cluster this row belongs to
    pub patient_key: PatientKey,
    /// Whether another row of the cluster is canonical
    pub is_duplicate: bool,
    /// Whether the row carried every demographic field needed for matching
    pub identity_complete: bool,
    /// The standardized row
    pub record: StandardizedPatient,
}

impl SilverPatient {
    /// Raw identifier of this row, kept even when it is a duplicate
    #[must_use]
    pub const fn original_patient_id(&self) -> i64 {
        self.record.patient_id
    }
}

/// A diagnosis row with a standardized code
#[derive(Debug, Clone, PartialEq)]
pub struct SilverDiagnosis {
    pub diagnosis_id: i64,
    pub patient_id: i64,
    pub code: StandardizedField<String>,
    pub description: Option<String>,
    pub is_primary: bool,
}

/// A lab row with standardized test name and date, before outlier annotation
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedLabResult {
    pub lab_id: i64,
    pub patient_id: i64,
    /// Trimmed raw test name
    pub test_name: Option<String>,
    /// Panel the test name resolves to
    pub test: Option<LabTest>,
    pub test_value: Option<f64>,
    pub test_date: StandardizedField<NaiveDate>,
    pub reference_range: Option<String>,
}

/// Result of the IQR rule for one lab value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierStatus {
    /// Within the inlier interval of its test group
    Inlier,
    /// Strictly outside the inlier interval
    Outlier,
    /// No decision: missing value or a group below the minimum sample size
    NotEvaluated,
}

/// A lab row annotated by the outlier detector
#[derive(Debug, Clone, PartialEq)]
pub struct SilverLabResult {
    pub lab: StandardizedLabResult,
    pub outlier: OutlierStatus,
    /// False for negative or non-finite values of tests that cannot be negative
    pub value_valid: bool,
}

impl SilverLabResult {
    /// Whether the IQR rule flagged the value
    #[must_use]
    pub fn is_outlier(&self) -> bool {
        self.outlier == OutlierStatus::Outlier
    }
}

/// A medication row with canonical name and parsed dates
#[derive(Debug, Clone, PartialEq)]
pub struct SilverMedication {
    pub medication_id: i64,
    pub patient_id: i64,
    pub name: StandardizedField<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: StandardizedField<NaiveDate>,
    pub end_date: StandardizedField<NaiveDate>,
}

/// Silver layer: all four sources standardized, patients keyed, labs annotated
#[derive(Debug, Clone, PartialEq)]
pub struct SilverTables {
    pub patients: Vec<SilverPatient>,
    pub diagnoses: Vec<SilverDiagnosis>,
    pub lab_results: Vec<SilverLabResult>,
    pub medications: Vec<SilverMedication>,
}
