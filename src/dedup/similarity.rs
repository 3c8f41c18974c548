//! Pairwise identity scoring

use crate::config::DeduplicationConfig;

use super::blocking::IdentityFields;

/// Scores candidate pairs inside a block
#[derive(Debug, Clone)]
pub struct PairScorer<'a> {
    config: &'a DeduplicationConfig,
}

impl<'a> PairScorer<'a> {
    /// Create a scorer with the configured thresholds and weights
    #[must_use]
    pub const fn new(config: &'a DeduplicationConfig) -> Self {
        Self { config }
    }

    /// Jaro-Winkler similarity of two normalized names
    #[must_use]
    pub fn name_similarity(a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }

    /// Weighted score of a pair, or `None` when a hard requirement fails
    ///
    /// The birth date must match exactly and each name must reach the name
    /// similarity threshold before weights are applied.
    #[must_use]
    pub fn score(&self, a: &IdentityFields, b: &IdentityFields) -> Option<f64> {
        if a.date_of_birth != b.date_of_birth {
            return None;
        }

        let first = Self::name_similarity(&a.first_name, &b.first_name);
        let last = Self::name_similarity(&a.last_name, &b.last_name);
        if first < self.config.name_similarity_threshold
            || last < self.config.name_similarity_threshold
        {
            return None;
        }

        let total_weight =
            self.config.first_name_weight + self.config.last_name_weight + self.config.birth_date_weight;
        let weighted = self.config.first_name_weight * first
            + self.config.last_name_weight * last
            + self.config.birth_date_weight;
        Some(weighted / total_weight)
    }

    /// Whether the pair refers to the same person
    #[must_use]
    pub fn is_match(&self, a: &IdentityFields, b: &IdentityFields) -> bool {
        self.score(a, b)
            .is_some_and(|score| score >= self.config.match_threshold)
    }
}
