//! A batch pipeline turning raw hospital extracts into a deduplicated,
//! patient-level readmission feature table and a data quality report.
//!
//! Stages run in medallion order: ingestion (bronze), standardization,
//! identity resolution and outlier annotation (silver), then feature
//! aggregation and quality metrics (gold).

pub mod config;
pub mod dedup;
pub mod error;
pub mod features;
pub mod ingest;
pub mod lookup;
pub mod models;
pub mod outlier;
pub mod pipeline;
pub mod quality;
pub mod standardize;
pub mod utils;

// Re-export the most common types for easier use
pub use config::PipelineConfig;
pub use dedup::{DedupEngine, IdentityResolution, PatientIdentityCluster};
pub use error::{IssueKind, PipelineError, Result, SourceKind};
pub use features::FeatureAggregator;
pub use ingest::Ingestor;
pub use lookup::LookupTables;
pub use outlier::OutlierDetector;
pub use pipeline::{Pipeline, PipelineOutput};
pub use quality::{QualityMetric, QualityReport, QualityReporter};
pub use standardize::{FieldKind, StandardizationEngine};

// IO
pub use utils::io::{load_sources, write_outputs};
