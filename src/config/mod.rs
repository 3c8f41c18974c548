//! Configuration for the readmission pipeline.
//!
//! Every section has defaults matching the reference extracts, so an empty
//! TOML file (or [`PipelineConfig::default`]) is a valid configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Top-level configuration for a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Field standardization rules
    pub standardization: StandardizationConfig,
    /// Identity matching parameters
    pub deduplication: DeduplicationConfig,
    /// IQR outlier rule parameters
    pub outliers: OutlierConfig,
    /// Completeness gate policy
    pub completeness: CompletenessPolicy,
    /// Feature derivation options
    pub features: FeatureConfig,
    /// Worker pool and progress reporting
    pub runtime: RuntimeConfig,
}

impl PipelineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let dedup = &self.deduplication;
        for (name, value) in [
            ("name_similarity_threshold", dedup.name_similarity_threshold),
            ("match_threshold", dedup.match_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PipelineError::Config(format!(
                    "deduplication.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        let weight_sum = dedup.first_name_weight + dedup.last_name_weight + dedup.birth_date_weight;
        if weight_sum <= 0.0 {
            return Err(PipelineError::Config(
                "deduplication weights must sum to a positive value".to_string(),
            ));
        }
        if self.outliers.iqr_multiplier < 0.0 {
            return Err(PipelineError::Config(format!(
                "outliers.iqr_multiplier must not be negative, got {}",
                self.outliers.iqr_multiplier
            )));
        }
        if self.outliers.min_sample_size < 4 {
            return Err(PipelineError::Config(format!(
                "outliers.min_sample_size must be at least 4, got {}",
                self.outliers.min_sample_size
            )));
        }
        if self.completeness.min_age > self.completeness.max_age {
            return Err(PipelineError::Config(format!(
                "completeness.min_age ({}) exceeds max_age ({})",
                self.completeness.min_age, self.completeness.max_age
            )));
        }
        if self.standardization.date_formats.is_empty() {
            return Err(PipelineError::Config(
                "standardization.date_formats must list at least one format".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(
            f,
            "  Date Formats: {}",
            self.standardization.date_formats.join(", ")
        )?;
        writeln!(
            f,
            "  Extra Medication Aliases: {}",
            self.standardization.medication_aliases.len()
        )?;
        writeln!(
            f,
            "  Name Similarity Threshold: {:.2}",
            self.deduplication.name_similarity_threshold
        )?;
        writeln!(
            f,
            "  Match Threshold: {:.2}",
            self.deduplication.match_threshold
        )?;
        writeln!(
            f,
            "  Outlier Rule: IQR x {} (min sample {})",
            self.outliers.iqr_multiplier, self.outliers.min_sample_size
        )?;
        writeln!(
            f,
            "  Age Range: {}-{}",
            self.completeness.min_age, self.completeness.max_age
        )?;
        writeln!(
            f,
            "  Exclude Incomplete Identities: {}",
            self.completeness.exclude_incomplete_identity
        )?;
        writeln!(
            f,
            "  Labs Restricted To Stay: {}",
            self.features.restrict_labs_to_stay
        )?;
        writeln!(f, "  Worker Threads: {}", self.runtime.effective_threads())?;
        Ok(())
    }
}

/// Configuration for field standardization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizationConfig {
    /// Date formats tried in order; the first successful parse wins
    pub date_formats: Vec<String>,
    /// Additional medication spellings, keyed by variant, valued by canonical name
    pub medication_aliases: BTreeMap<String, String>,
    /// Additional drug-class memberships, keyed by canonical name
    pub drug_classes: BTreeMap<String, String>,
}

impl Default for StandardizationConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%m/%d/%Y".to_string(), // US: 01/15/2023
                "%Y-%m-%d".to_string(), // ISO format: 2023-01-15
                "%Y/%m/%d".to_string(), // 2023/01/15
                "%Y%m%d".to_string(),   // Compact: 20230115
            ],
            medication_aliases: BTreeMap::new(),
            drug_classes: BTreeMap::new(),
        }
    }
}

/// Parameters for identity matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicationConfig {
    /// Minimum Jaro-Winkler similarity for each of first and last name
    pub name_similarity_threshold: f64,
    /// Minimum weighted score for a pair to be merged
    pub match_threshold: f64,
    /// Weight of the first-name similarity in the pair score
    pub first_name_weight: f64,
    /// Weight of the last-name similarity in the pair score
    pub last_name_weight: f64,
    /// Weight of the (mandatory) birth-date match in the pair score
    pub birth_date_weight: f64,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            name_similarity_threshold: 0.85,
            match_threshold: 0.9,
            first_name_weight: 0.4,
            last_name_weight: 0.4,
            birth_date_weight: 0.2,
        }
    }
}

/// Parameters for the IQR outlier rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Groups with fewer finite values are not evaluated
    pub min_sample_size: usize,
    /// Multiplier applied to the IQR when building the inlier interval
    pub iqr_multiplier: f64,
    /// Test names (case-insensitive) for which a negative value is invalid
    pub non_negative_tests: Vec<String>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            min_sample_size: 8,
            iqr_multiplier: 1.5,
            non_negative_tests: vec![
                "Hemoglobin".to_string(),
                "Glucose".to_string(),
                "WBC".to_string(),
                "Creatinine".to_string(),
                "BUN".to_string(),
            ],
        }
    }
}

/// Policy deciding which patients reach the feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessPolicy {
    /// Exclude clusters whose demographics were too sparse to deduplicate
    pub exclude_incomplete_identity: bool,
    /// Minimum valid age at admission
    pub min_age: i32,
    /// Maximum valid age at admission
    pub max_age: i32,
    /// Exclude patients without a recognizable gender
    pub require_gender: bool,
    /// Accept same-day discharges
    pub allow_zero_length_of_stay: bool,
}

impl Default for CompletenessPolicy {
    fn default() -> Self {
        Self {
            exclude_incomplete_identity: true,
            min_age: 0,
            max_age: 120,
            require_gender: false,
            allow_zero_length_of_stay: true,
        }
    }
}

/// Options for feature derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Only count and average labs dated within the admission
    pub restrict_labs_to_stay: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            restrict_labs_to_stay: true,
        }
    }
}

/// Worker pool and progress options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads; 0 uses the number of logical CPUs
    pub worker_threads: usize,
    /// Draw progress bars for the parallel stages
    pub show_progress: bool,
}

impl RuntimeConfig {
    /// Resolve the configured thread count
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}
