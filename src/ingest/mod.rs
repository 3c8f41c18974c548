//! Ingestion adapter
//!
//! Checks that every required source is present, then wraps each raw row with
//! its provenance. No value is altered here.

use chrono::{DateTime, Utc};

use crate::error::{PipelineError, Result, SourceKind};
use crate::models::{BronzeTables, Provenance, RawRecord, SourceTable, SourceTables};

/// Attaches provenance to raw rows for one pipeline run
#[derive(Debug, Clone, Copy)]
pub struct Ingestor {
    ingest_timestamp: DateTime<Utc>,
}

impl Ingestor {
    /// Create an ingestor stamping every row with `ingest_timestamp`
    #[must_use]
    pub const fn new(ingest_timestamp: DateTime<Utc>) -> Self {
        Self { ingest_timestamp }
    }

    /// Ensure all four sources exist before any row is touched
    ///
    /// A missing source is fatal: no partial result is meaningful without it.
    pub fn check_sources(sources: &SourceTables) -> Result<()> {
        let present = [
            sources.patients.is_some(),
            sources.diagnoses.is_some(),
            sources.lab_results.is_some(),
            sources.medications.is_some(),
        ];
        match SourceKind::ALL
            .iter()
            .zip(present)
            .find(|(_, is_present)| !is_present)
        {
            Some((kind, _)) => Err(PipelineError::MissingSource(*kind)),
            None => Ok(()),
        }
    }

    /// Produce the bronze layer from the raw sources
    pub fn ingest(&self, sources: SourceTables) -> Result<BronzeTables> {
        let (patients, diagnoses, lab_results, medications) = match (
            sources.patients,
            sources.diagnoses,
            sources.lab_results,
            sources.medications,
        ) {
            (Some(p), Some(d), Some(l), Some(m)) => (p, d, l, m),
            (None, ..) => return Err(PipelineError::MissingSource(SourceKind::Patients)),
            (_, None, ..) => return Err(PipelineError::MissingSource(SourceKind::Diagnoses)),
            (_, _, None, _) => return Err(PipelineError::MissingSource(SourceKind::LabResults)),
            (_, _, _, None) => return Err(PipelineError::MissingSource(SourceKind::Medications)),
        };

        let bronze = BronzeTables {
            patients: self.wrap(patients),
            diagnoses: self.wrap(diagnoses),
            lab_results: self.wrap(lab_results),
            medications: self.wrap(medications),
        };

        log::info!(
            "Ingested {} patients, {} diagnoses, {} lab results, {} medications",
            bronze.patients.len(),
            bronze.diagnoses.len(),
            bronze.lab_results.len(),
            bronze.medications.len()
        );

        Ok(bronze)
    }

    fn wrap<T>(&self, table: SourceTable<T>) -> Vec<RawRecord<T>> {
        let provenance = Provenance {
            ingest_timestamp: self.ingest_timestamp,
            source_file: table.source_file,
        };
        table
            .rows
            .into_iter()
            .map(|row| RawRecord::new(row, provenance.clone()))
            .collect()
    }
}
