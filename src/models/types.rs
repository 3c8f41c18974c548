//! Common domain type definitions
//!
//! This module contains the small enum and newtype values shared by the
//! silver and gold models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Surrogate key of a canonical patient identity, stable for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientKey(pub u64);

impl fmt::Display for PatientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gender of a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Male gender
    Male,
    /// Female gender
    Female,
    /// Unknown or not specified
    Unknown,
}

impl Gender {
    /// Single-letter code used in the feature table
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Unknown => "U",
        }
    }
}

impl From<&str> for Gender {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Self::Male,
            "f" | "female" => Self::Female,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Laboratory panels the feature table averages
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabTest {
    /// Hemoglobin (g/dL)
    Hemoglobin,
    /// Blood glucose (mg/dL)
    Glucose,
    /// White blood cell count (K/uL)
    Wbc,
    /// Serum creatinine (mg/dL)
    Creatinine,
    /// Blood urea nitrogen (mg/dL)
    Bun,
    /// Any other test, kept under its trimmed name
    Other(String),
}

impl LabTest {
    /// The panels required by the feature table, in output order
    pub const REQUIRED: [Self; 5] = [
        Self::Hemoglobin,
        Self::Glucose,
        Self::Wbc,
        Self::Creatinine,
        Self::Bun,
    ];

    /// Resolve a raw test name, case-insensitively, onto a known panel
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_uppercase().as_str() {
            "HEMOGLOBIN" | "HAEMOGLOBIN" | "HGB" | "HB" => Self::Hemoglobin,
            "GLUCOSE" | "GLU" | "BLOOD GLUCOSE" => Self::Glucose,
            "WBC" | "WHITE BLOOD CELL COUNT" | "WHITE BLOOD CELLS" | "LEUKOCYTES" => Self::Wbc,
            "CREATININE" | "CREA" | "CREAT" => Self::Creatinine,
            "BUN" | "BLOOD UREA NITROGEN" | "UREA NITROGEN" => Self::Bun,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Canonical display name, used as the outlier grouping key
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Hemoglobin => "Hemoglobin",
            Self::Glucose => "Glucose",
            Self::Wbc => "WBC",
            Self::Creatinine => "Creatinine",
            Self::Bun => "BUN",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for LabTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
