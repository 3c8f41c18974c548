//! Standardization engine
//!
//! Pure, deterministic and idempotent normalization of diagnosis codes,
//! medication names and dates. Table-level helpers apply the rules to every
//! bronze row in parallel; each row is independent so no locking is involved.

pub mod date;
pub mod diagnosis;
pub mod medication;

use std::fmt;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::lookup::LookupTables;
use crate::models::{
    Gender, LabTest, RawDiagnosis, RawLabResult, RawMedication, RawPatient, RawRecord,
    SilverDiagnosis, SilverMedication, StandardizedField, StandardizedLabResult,
    StandardizedPatient,
};

pub use date::{CANONICAL_DATE_FORMAT, DateStandardizer};
pub use diagnosis::{category, is_icd10_shape, normalize_code};
pub use medication::MedicationDictionary;

/// Kind of field a raw value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// ICD-10 diagnosis code
    DiagnosisCode,
    /// Medication name
    MedicationName,
    /// Calendar date
    Date,
}

/// A standardized value of any field kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StandardValue {
    /// Normalized diagnosis code
    Code(String),
    /// Canonical (or passed-through) medication name
    Medication(String),
    /// Parsed date
    Date(NaiveDate),
}

impl fmt::Display for StandardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => f.write_str(code),
            Self::Medication(name) => f.write_str(name),
            Self::Date(date) => write!(f, "{}", date.format(CANONICAL_DATE_FORMAT)),
        }
    }
}

/// Applies the standardization rules using the run's lookup tables
#[derive(Debug, Clone, Copy)]
pub struct StandardizationEngine<'a> {
    dates: &'a DateStandardizer,
    medications: &'a MedicationDictionary,
}

impl<'a> StandardizationEngine<'a> {
    /// Create an engine borrowing the run's read-only lookup tables
    #[must_use]
    pub const fn new(lookups: &'a LookupTables) -> Self {
        Self {
            dates: &lookups.dates,
            medications: &lookups.medications,
        }
    }

    /// Standardize one raw value of the given kind
    #[must_use]
    pub fn standardize(&self, raw: Option<&str>, kind: FieldKind) -> StandardizedField<StandardValue> {
        match kind {
            FieldKind::DiagnosisCode => diagnosis::standardize_code(raw).map(StandardValue::Code),
            FieldKind::MedicationName => self
                .medications
                .standardize(raw)
                .map(StandardValue::Medication),
            FieldKind::Date => self.dates.standardize(raw).map(StandardValue::Date),
        }
    }

    /// Standardize one patient row
    #[must_use]
    pub fn patient(&self, raw: &RawPatient) -> StandardizedPatient {
        StandardizedPatient {
            patient_id: raw.patient_id,
            first_name: trimmed(raw.first_name.as_deref()),
            last_name: trimmed(raw.last_name.as_deref()),
            date_of_birth: self.dates.standardize(raw.date_of_birth.as_deref()),
            reported_age: raw.age,
            gender: raw.gender.as_deref().map_or(Gender::Unknown, Gender::from),
            admission_date: self.dates.standardize(raw.admission_date.as_deref()),
            discharge_date: self.dates.standardize(raw.discharge_date.as_deref()),
            reported_length_of_stay: raw.length_of_stay,
            readmitted_30_days: raw.readmitted_30_days,
        }
    }

    /// Standardize one diagnosis row
    #[must_use]
    pub fn diagnosis(&self, raw: &RawDiagnosis) -> SilverDiagnosis {
        SilverDiagnosis {
            diagnosis_id: raw.diagnosis_id,
            patient_id: raw.patient_id,
            code: diagnosis::standardize_code(raw.diagnosis_code.as_deref()),
            description: raw.diagnosis_description.clone(),
            is_primary: raw.primary_diagnosis == Some(1),
        }
    }

    /// Standardize one lab row; outlier annotation happens later
    #[must_use]
    pub fn lab_result(&self, raw: &RawLabResult) -> StandardizedLabResult {
        let test_name = trimmed(raw.test_name.as_deref());
        StandardizedLabResult {
            lab_id: raw.lab_id,
            patient_id: raw.patient_id,
            test: test_name.as_deref().map(LabTest::from_name),
            test_name,
            test_value: raw.test_value,
            test_date: self.dates.standardize(raw.test_date.as_deref()),
            reference_range: raw.reference_range.clone(),
        }
    }

    /// Standardize one medication row
    #[must_use]
    pub fn medication(&self, raw: &RawMedication) -> SilverMedication {
        SilverMedication {
            medication_id: raw.medication_id,
            patient_id: raw.patient_id,
            name: self.medications.standardize(raw.medication_name.as_deref()),
            dosage: raw.dosage.clone(),
            frequency: raw.frequency.clone(),
            start_date: self.dates.standardize(raw.start_date.as_deref()),
            end_date: self.dates.standardize(raw.end_date.as_deref()),
        }
    }

    /// Standardize every patient row, preserving order
    #[must_use]
    pub fn patients(&self, rows: &[RawRecord<RawPatient>]) -> Vec<StandardizedPatient> {
        rows.par_iter().map(|row| self.patient(row.record())).collect()
    }

    /// Standardize every diagnosis row, preserving order
    #[must_use]
    pub fn diagnoses(&self, rows: &[RawRecord<RawDiagnosis>]) -> Vec<SilverDiagnosis> {
        rows.par_iter().map(|row| self.diagnosis(row.record())).collect()
    }

    /// Standardize every lab row, preserving order
    #[must_use]
    pub fn lab_results(&self, rows: &[RawRecord<RawLabResult>]) -> Vec<StandardizedLabResult> {
        rows.par_iter().map(|row| self.lab_result(row.record())).collect()
    }

    /// Standardize every medication row, preserving order
    #[must_use]
    pub fn medications(&self, rows: &[RawRecord<RawMedication>]) -> Vec<SilverMedication> {
        rows.par_iter().map(|row| self.medication(row.record())).collect()
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
