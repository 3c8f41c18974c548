//! Identity fields and blocking keys
//!
//! Only rows sharing a normalized last name and birth year are ever compared,
//! which keeps the pairwise scoring far below quadratic in the patient count.

use chrono::{Datelike, NaiveDate};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::models::StandardizedPatient;

/// Uppercase a name and keep only its letters and digits
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Demographics used for matching, extracted from a standardized patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityFields {
    /// Position of the row in the patient array
    pub index: usize,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

impl IdentityFields {
    /// Extract identity fields, or `None` when any of them is missing
    #[must_use]
    pub fn extract(index: usize, patient: &StandardizedPatient) -> Option<Self> {
        let first_name = patient
            .first_name
            .as_deref()
            .map(normalize_name)
            .filter(|s| !s.is_empty())?;
        let last_name = patient
            .last_name
            .as_deref()
            .map(normalize_name)
            .filter(|s| !s.is_empty())?;
        let date_of_birth = patient.date_of_birth.get()?;
        Some(Self {
            index,
            first_name,
            last_name,
            date_of_birth,
        })
    }

    /// Blocking key of this identity
    #[must_use]
    pub fn block_key(&self) -> BlockKey {
        BlockKey {
            last_name: self.last_name.clone(),
            birth_year: self.date_of_birth.year(),
        }
    }
}

/// Normalized last name plus birth year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub last_name: String,
    pub birth_year: i32,
}

/// Positions (into the identity slice) of the rows sharing a blocking key
pub type Block = SmallVec<[usize; 8]>;

/// Partition identities into blocks, ordered by key for reproducible logs
#[must_use]
pub fn build_blocks(identities: &[IdentityFields]) -> Vec<(BlockKey, Block)> {
    let mut blocks: FxHashMap<BlockKey, Block> = FxHashMap::default();
    for (position, identity) in identities.iter().enumerate() {
        blocks.entry(identity.block_key()).or_default().push(position);
    }
    let mut blocks: Vec<(BlockKey, Block)> = blocks.into_iter().collect();
    blocks.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    blocks
}
