//! Gold-layer records: the classifier-ready feature table

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::PatientKey;

/// One row of the feature table, one per retained canonical patient
///
/// Binary indicators are stored as `0`/`1` so the table can be fed to a
/// classifier without further casting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatureVector {
    pub patient_key: PatientKey,
    pub original_patient_id: i64,
    pub age: i32,
    pub gender: String,
    pub length_of_stay: i32,
    pub num_diagnoses: u32,
    pub num_chronic_conditions: u32,
    pub has_diabetes: u8,
    pub has_heart_disease: u8,
    pub has_copd: u8,
    pub has_ckd: u8,
    pub has_anxiety: u8,
    pub num_medications: u32,
    pub on_metformin: u8,
    pub on_ace_inhibitor: u8,
    pub on_statin: u8,
    pub num_lab_tests: u32,
    pub avg_hemoglobin: Option<f64>,
    pub avg_glucose: Option<f64>,
    pub avg_wbc: Option<f64>,
    pub avg_creatinine: Option<f64>,
    pub avg_bun: Option<f64>,
    pub target_readmitted_30_days: u8,
    pub feature_generation_date: DateTime<Utc>,
}

impl PatientFeatureVector {
    /// Output column names, in order
    pub const COLUMNS: [&'static str; 24] = [
        "patient_key",
        "original_patient_id",
        "age",
        "gender",
        "length_of_stay",
        "num_diagnoses",
        "num_chronic_conditions",
        "has_diabetes",
        "has_heart_disease",
        "has_copd",
        "has_ckd",
        "has_anxiety",
        "num_medications",
        "on_metformin",
        "on_ace_inhibitor",
        "on_statin",
        "num_lab_tests",
        "avg_hemoglobin",
        "avg_glucose",
        "avg_wbc",
        "avg_creatinine",
        "avg_bun",
        "target_readmitted_30_days",
        "feature_generation_date",
    ];

    /// Whether the patient was readmitted within 30 days
    #[must_use]
    pub const fn is_readmitted(&self) -> bool {
        self.target_readmitted_30_days == 1
    }
}

/// Ordered distinct diagnosis codes of a retained patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDiagnosisCodes {
    pub patient_key: PatientKey,
    pub codes: Vec<String>,
}

/// Why a patient was kept out of the feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Demographics too sparse for reliable deduplication
    IncompleteIdentity,
    /// Admission date missing or unparseable
    MissingAdmissionDate,
    /// Discharge date missing or unparseable
    MissingDischargeDate,
    /// Discharge before admission
    NegativeLengthOfStay,
    /// Same-day discharge while the policy disallows it
    ZeroLengthOfStay,
    /// Age missing or outside the accepted range
    InvalidAge,
    /// Gender unknown while the policy requires it
    MissingGender,
    /// Readmission label missing or not binary
    MissingTarget,
}

impl ExclusionReason {
    /// All reasons in reporting order
    pub const ALL: [Self; 8] = [
        Self::IncompleteIdentity,
        Self::MissingAdmissionDate,
        Self::MissingDischargeDate,
        Self::NegativeLengthOfStay,
        Self::ZeroLengthOfStay,
        Self::InvalidAge,
        Self::MissingGender,
        Self::MissingTarget,
    ];

    /// Short reason code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::IncompleteIdentity => "incomplete_identity",
            Self::MissingAdmissionDate => "missing_admission_date",
            Self::MissingDischargeDate => "missing_discharge_date",
            Self::NegativeLengthOfStay => "negative_length_of_stay",
            Self::ZeroLengthOfStay => "zero_length_of_stay",
            Self::InvalidAge => "invalid_age",
            Self::MissingGender => "missing_gender",
            Self::MissingTarget => "missing_target",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A patient left out of the feature table, with the first failing check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub patient_key: PatientKey,
    pub original_patient_id: i64,
    pub reason: ExclusionReason,
}

/// Gold layer output of the feature aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct GoldTables {
    /// One row per retained patient, ordered by patient key
    pub features: Vec<PatientFeatureVector>,
    /// Diagnosis code lists of retained patients, ordered by patient key
    pub diagnosis_codes: Vec<PatientDiagnosisCodes>,
    /// Patients that failed the completeness gate, ordered by patient key
    pub exclusions: Vec<Exclusion>,
}
