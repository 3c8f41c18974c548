//! Chronic condition code groups
//!
//! Membership is decided on the three-character ICD-10 category of a
//! standardized code, so `E11` and `E11.9` both count as diabetes while
//! remaining distinct codes.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::standardize::category;

/// Chronic conditions tracked by the feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChronicCondition {
    /// Diabetes mellitus (E10-E11, E13)
    Diabetes,
    /// Hypertensive, ischaemic heart disease and heart failure
    HeartDisease,
    /// Chronic obstructive pulmonary disease (J43-J44)
    Copd,
    /// Chronic kidney disease (N18)
    ChronicKidneyDisease,
    /// Anxiety disorders (F41)
    Anxiety,
}

impl ChronicCondition {
    /// All tracked conditions in output order
    pub const ALL: [Self; 5] = [
        Self::Diabetes,
        Self::HeartDisease,
        Self::Copd,
        Self::ChronicKidneyDisease,
        Self::Anxiety,
    ];

    /// Get the display name for this condition
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Diabetes => "Diabetes",
            Self::HeartDisease => "Heart Disease",
            Self::Copd => "COPD",
            Self::ChronicKidneyDisease => "Chronic Kidney Disease",
            Self::Anxiety => "Anxiety",
        }
    }

    /// Whether the condition contributes to `num_chronic_conditions`
    ///
    /// Anxiety is flagged but not counted as a chronic somatic condition.
    #[must_use]
    pub const fn counts_as_chronic(self) -> bool {
        !matches!(self, Self::Anxiety)
    }

    /// ICD-10 categories belonging to the condition
    #[must_use]
    pub const fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Diabetes => &["E10", "E11", "E13"],
            Self::HeartDisease => &["I10", "I11", "I13", "I20", "I21", "I25", "I50"],
            Self::Copd => &["J43", "J44"],
            Self::ChronicKidneyDisease => &["N18"],
            Self::Anxiety => &["F41"],
        }
    }
}

impl fmt::Display for ChronicCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Read-only map from ICD-10 category to chronic condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGroupTable {
    by_category: FxHashMap<&'static str, ChronicCondition>,
}

impl CodeGroupTable {
    /// Build the table from the condition definitions
    #[must_use]
    pub fn new() -> Self {
        let by_category = ChronicCondition::ALL
            .iter()
            .flat_map(|condition| {
                condition
                    .categories()
                    .iter()
                    .map(move |category| (*category, *condition))
            })
            .collect();
        Self { by_category }
    }

    /// Condition a standardized code belongs to, if any
    #[must_use]
    pub fn condition_for(&self, code: &str) -> Option<ChronicCondition> {
        category(code).and_then(|cat| self.by_category.get(cat).copied())
    }
}

impl Default for CodeGroupTable {
    fn default() -> Self {
        Self::new()
    }
}
