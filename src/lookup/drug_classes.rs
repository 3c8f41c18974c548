//! Drug class membership of canonical medication names
//!
//! Watch-list flags are decided by class, so any statin counts for
//! `on_statin`, not only the one spelled in the reference extract.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::standardize::medication::lookup_key;

/// Drug classes on the feature watch-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrugClass {
    /// Biguanides (metformin)
    Biguanide,
    /// Angiotensin-converting-enzyme inhibitors
    AceInhibitor,
    /// HMG-CoA reductase inhibitors
    Statin,
}

impl DrugClass {
    /// Parse a class name as written in configuration files
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match lookup_key(name).replace(['-', '_'], " ").as_str() {
            "BIGUANIDE" | "METFORMIN" => Some(Self::Biguanide),
            "ACE INHIBITOR" | "ACEI" => Some(Self::AceInhibitor),
            "STATIN" => Some(Self::Statin),
            _ => None,
        }
    }
}

const DEFAULT_MEMBERS: &[(&str, DrugClass)] = &[
    ("Metformin", DrugClass::Biguanide),
    ("Lisinopril", DrugClass::AceInhibitor),
    ("Enalapril", DrugClass::AceInhibitor),
    ("Ramipril", DrugClass::AceInhibitor),
    ("Captopril", DrugClass::AceInhibitor),
    ("Benazepril", DrugClass::AceInhibitor),
    ("Atorvastatin", DrugClass::Statin),
    ("Simvastatin", DrugClass::Statin),
    ("Rosuvastatin", DrugClass::Statin),
    ("Pravastatin", DrugClass::Statin),
    ("Lovastatin", DrugClass::Statin),
];

/// Read-only map from canonical medication name to drug class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugClassTable {
    class_by_key: FxHashMap<String, DrugClass>,
}

impl DrugClassTable {
    /// Build the default table extended with configured memberships
    ///
    /// Unknown class names in `extra` are skipped with a warning.
    #[must_use]
    pub fn new(extra: &BTreeMap<String, String>) -> Self {
        let mut class_by_key: FxHashMap<String, DrugClass> = DEFAULT_MEMBERS
            .iter()
            .map(|(name, class)| (lookup_key(name), *class))
            .collect();

        for (name, class_name) in extra {
            match DrugClass::from_name(class_name) {
                Some(class) => {
                    class_by_key.insert(lookup_key(name), class);
                }
                None => log::warn!("Ignoring unknown drug class '{class_name}' for '{name}'"),
            }
        }

        Self { class_by_key }
    }

    /// Class of a canonical medication name, if it is on the watch-list
    #[must_use]
    pub fn class_of(&self, name: &str) -> Option<DrugClass> {
        self.class_by_key.get(&lookup_key(name)).copied()
    }
}

impl Default for DrugClassTable {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}
