//! Medication name canonicalization
//!
//! Spelling and casing variants resolve to one canonical name through a
//! dictionary built once per run. Unknown names pass through untouched and are
//! reported as unrecognized.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::models::{FieldStatus, StandardizedField};

/// Known variants of the medications found in the admission extracts
const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("Metformin", &["METFORMIN", "METFORMINE", "METFORMIN HCL"]),
    ("Lisinopril", &["LISINOPRIL", "LISINOPREL"]),
    ("Enalapril", &["ENALAPRIL"]),
    ("Ramipril", &["RAMIPRIL"]),
    ("Atorvastatin", &["ATORVASTATIN", "ATORVASTINE"]),
    ("Simvastatin", &["SIMVASTATIN"]),
    ("Rosuvastatin", &["ROSUVASTATIN"]),
    ("Pravastatin", &["PRAVASTATIN"]),
    ("Omeprazole", &["OMEPRAZOLE", "OMEPRAZOL"]),
    ("Albuterol", &["ALBUTEROL", "ALBUTEROL INHALER"]),
    ("Aspirin", &["ASPIRIN", "ASA"]),
];

/// Dictionary key of a medication name: uppercase, single-spaced, trimmed
#[must_use]
pub fn lookup_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read-only canonicalization table for medication names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationDictionary {
    canonical_by_key: FxHashMap<String, String>,
}

impl MedicationDictionary {
    /// Build the default dictionary extended with configured aliases
    ///
    /// `extra_aliases` maps a variant spelling to its canonical name; entries
    /// override the defaults.
    #[must_use]
    pub fn new(extra_aliases: &BTreeMap<String, String>) -> Self {
        let mut canonical_by_key = FxHashMap::default();

        for (canonical, variants) in DEFAULT_ALIASES {
            canonical_by_key.insert(lookup_key(canonical), (*canonical).to_string());
            for variant in *variants {
                canonical_by_key.insert(lookup_key(variant), (*canonical).to_string());
            }
        }

        for (variant, canonical) in extra_aliases {
            // Canonical names must resolve to themselves to keep the mapping idempotent
            canonical_by_key.insert(lookup_key(canonical), canonical.clone());
            canonical_by_key.insert(lookup_key(variant), canonical.clone());
        }

        Self { canonical_by_key }
    }

    /// Canonical name for a raw name, if known
    #[must_use]
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.canonical_by_key
            .get(&lookup_key(name))
            .map(String::as_str)
    }

    /// Number of recognized spellings
    #[must_use]
    pub fn len(&self) -> usize {
        self.canonical_by_key.len()
    }

    /// Whether the dictionary is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical_by_key.is_empty()
    }

    /// Standardize an optional raw medication name
    #[must_use]
    pub fn standardize(&self, raw: Option<&str>) -> StandardizedField<String> {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return StandardizedField::missing();
        };

        match self.canonical(raw) {
            Some(canonical) => StandardizedField {
                raw: Some(raw.to_string()),
                value: Some(canonical.to_string()),
                was_changed: canonical != raw,
                status: FieldStatus::Valid,
            },
            None => StandardizedField {
                raw: Some(raw.to_string()),
                value: Some(raw.to_string()),
                was_changed: false,
                status: FieldStatus::Unrecognized,
            },
        }
    }
}

impl Default for MedicationDictionary {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}
