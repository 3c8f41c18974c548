//! Lookup tables shared by the pipeline stages
//!
//! The tables are built once at the start of a run from the configuration and
//! then only borrowed, so workers can read them concurrently.

pub mod code_groups;
pub mod drug_classes;

pub use code_groups::{ChronicCondition, CodeGroupTable};
pub use drug_classes::{DrugClass, DrugClassTable};

use crate::config::StandardizationConfig;
use crate::standardize::{DateStandardizer, MedicationDictionary};

/// All read-only tables of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTables {
    /// Accepted date formats
    pub dates: DateStandardizer,
    /// Medication canonicalization dictionary
    pub medications: MedicationDictionary,
    /// Drug class membership for the medication watch-list
    pub drug_classes: DrugClassTable,
    /// ICD-10 categories of the tracked chronic conditions
    pub code_groups: CodeGroupTable,
}

impl LookupTables {
    /// Build every table from the standardization configuration
    #[must_use]
    pub fn from_config(config: &StandardizationConfig) -> Self {
        Self {
            dates: DateStandardizer::new(config.date_formats.clone()),
            medications: MedicationDictionary::new(&config.medication_aliases),
            drug_classes: DrugClassTable::new(&config.drug_classes),
            code_groups: CodeGroupTable::new(),
        }
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::from_config(&StandardizationConfig::default())
    }
}
