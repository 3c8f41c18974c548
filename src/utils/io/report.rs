//! Writers for the run outputs

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{GoldTables, PatientDiagnosisCodes, PatientFeatureVector, PatientKey};
use crate::quality::{QualityMetric, QualityReport};

use super::parquet::{SchemaSample, write_records};

/// Feature table file name
pub const FEATURES_FILE: &str = "patient_readmission_features.parquet";
/// Per-patient diagnosis code lists
pub const DIAGNOSIS_CODES_FILE: &str = "patient_diagnosis_codes.parquet";
/// Quality metric table
pub const METRICS_FILE: &str = "data_quality_metrics.parquet";
/// Full quality report with failures and exclusions
pub const REPORT_FILE: &str = "quality_report.json";

impl SchemaSample for PatientFeatureVector {
    fn schema_sample() -> Self {
        Self {
            patient_key: PatientKey(1),
            original_patient_id: 1,
            age: 0,
            gender: "U".to_string(),
            length_of_stay: 0,
            num_diagnoses: 0,
            num_chronic_conditions: 0,
            has_diabetes: 0,
            has_heart_disease: 0,
            has_copd: 0,
            has_ckd: 0,
            has_anxiety: 0,
            num_medications: 0,
            on_metformin: 0,
            on_ace_inhibitor: 0,
            on_statin: 0,
            num_lab_tests: 0,
            avg_hemoglobin: Some(0.0),
            avg_glucose: Some(0.0),
            avg_wbc: Some(0.0),
            avg_creatinine: Some(0.0),
            avg_bun: Some(0.0),
            target_readmitted_30_days: 0,
            feature_generation_date: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl SchemaSample for PatientDiagnosisCodes {
    fn schema_sample() -> Self {
        Self {
            patient_key: PatientKey(1),
            codes: vec!["E11".to_string()],
        }
    }
}

impl SchemaSample for QualityMetric {
    fn schema_sample() -> Self {
        Self {
            metric: String::new(),
            value: 0.0,
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Paths of everything [`write_outputs`] produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub features: PathBuf,
    pub diagnosis_codes: PathBuf,
    pub metrics: PathBuf,
    pub report: PathBuf,
}

/// Write the quality report as pretty-printed JSON
pub fn write_report_json(path: &Path, report: &QualityReport) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    log::info!("Wrote quality report to {}", path.display());
    Ok(())
}

/// Write the gold tables and the quality report into `dir`, creating it if needed
pub fn write_outputs(dir: &Path, gold: &GoldTables, report: &QualityReport) -> Result<OutputFiles> {
    std::fs::create_dir_all(dir)?;
    let files = OutputFiles {
        features: dir.join(FEATURES_FILE),
        diagnosis_codes: dir.join(DIAGNOSIS_CODES_FILE),
        metrics: dir.join(METRICS_FILE),
        report: dir.join(REPORT_FILE),
    };

    write_records(&files.features, &gold.features)?;
    write_records(&files.diagnosis_codes, &gold.diagnosis_codes)?;
    write_records(&files.metrics, &report.metrics)?;
    write_report_json(&files.report, report)?;
    Ok(files)
}
