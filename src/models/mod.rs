//! Domain models for the readmission pipeline
//!
//! The models follow the medallion layering of the pipeline: raw rows with
//! provenance (bronze), standardized and identity-resolved rows (silver), and
//! the patient-level feature table (gold).

pub mod field;
pub mod gold;
pub mod raw;
pub mod silver;
pub mod types;

// Re-export commonly used types
pub use field::{FieldStatus, StandardizedField};
pub use gold::{
    Exclusion, ExclusionReason, GoldTables, PatientDiagnosisCodes, PatientFeatureVector,
};
pub use raw::{
    BronzeTables, Provenance, RawDiagnosis, RawLabResult, RawMedication, RawPatient, RawRecord,
    SourceTable, SourceTables,
};
pub use silver::{
    OutlierStatus, SilverDiagnosis, SilverLabResult, SilverMedication, SilverPatient,
    SilverTables, StandardizedLabResult, StandardizedPatient,
};
pub use types::{Gender, LabTest, PatientKey};
