//! Pipeline orchestration
//!
//! Runs the stages bronze → silver → gold on a dedicated rayon pool. Lookup
//! tables are built once in [`Pipeline::new`] and only borrowed afterwards.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;
use crate::dedup::{DedupEngine, IdentityResolution};
use crate::error::{PipelineError, Result};
use crate::features::{FeatureAggregator, OrphanCounts};
use crate::ingest::Ingestor;
use crate::lookup::LookupTables;
use crate::models::{BronzeTables, GoldTables, SilverTables, SourceTables};
use crate::outlier::{GroupStatistics, OutlierDetector};
use crate::quality::{QualityInputs, QualityReport, QualityReporter};
use crate::standardize::StandardizationEngine;
use crate::utils::logging::{
    create_stage_progress_bar, finish_progress_bar, log_stage_complete, log_stage_start,
};

const STAGES: u64 = 6;

/// Everything a run produces, layer by layer
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub bronze: BronzeTables,
    pub silver: SilverTables,
    pub identity: IdentityResolution,
    /// Per-test statistics of the outlier detector
    pub lab_groups: Vec<GroupStatistics>,
    pub gold: GoldTables,
    pub orphans: OrphanCounts,
    pub quality: QualityReport,
}

/// A configured pipeline, reusable across runs
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    lookups: LookupTables,
    reporter: QualityReporter,
}

impl Pipeline {
    /// Validate the configuration and build the lookup tables
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let lookups = LookupTables::from_config(&config.standardization);
        log::debug!(
            "Lookup tables ready: {} medication names",
            lookups.medications.len()
        );
        Ok(Self {
            config,
            lookups,
            reporter: QualityReporter::default(),
        })
    }

    /// Run the pipeline, stamping outputs with the current time
    pub fn run(&self, sources: SourceTables) -> Result<PipelineOutput> {
        self.run_at(sources, Utc::now())
    }

    /// Run the pipeline with a fixed timestamp for provenance and outputs
    ///
    /// # Errors
    /// Returns [`PipelineError::MissingSource`] before any stage runs when a
    /// source table is absent, or [`PipelineError::ThreadPool`] when the
    /// worker pool cannot be built.
    pub fn run_at(&self, sources: SourceTables, now: DateTime<Utc>) -> Result<PipelineOutput> {
        Ingestor::check_sources(&sources)?;

        let threads = self.config.runtime.effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;
        log::info!("Running pipeline on {threads} worker threads");

        pool.install(|| self.execute(sources, now))
    }

    fn execute(&self, sources: SourceTables, now: DateTime<Utc>) -> Result<PipelineOutput> {
        let progress = create_stage_progress_bar(STAGES, self.config.runtime.show_progress);

        // Bronze
        progress.set_message("ingest");
        let started = Instant::now();
        let bronze = Ingestor::new(now).ingest(sources)?;
        log_stage_complete("ingest", bronze.patients.len(), started.elapsed());
        progress.inc(1);

        // Silver: standardization
        progress.set_message("standardize");
        let started = Instant::now();
        log_stage_start("standardize", bronze.patients.len());
        let engine = StandardizationEngine::new(&self.lookups);
        let patients = engine.patients(&bronze.patients);
        let diagnoses = engine.diagnoses(&bronze.diagnoses);
        let lab_results = engine.lab_results(&bronze.lab_results);
        let medications = engine.medications(&bronze.medications);
        log_stage_complete(
            "standardize",
            patients.len() + diagnoses.len() + lab_results.len() + medications.len(),
            started.elapsed(),
        );
        progress.inc(1);

        // Silver: identity resolution
        progress.set_message("deduplicate");
        let started = Instant::now();
        log_stage_start("deduplicate", patients.len());
        let identity = DedupEngine::new(&self.config.deduplication).resolve(&patients);
        let patients = identity.assign(patients);
        log_stage_complete("deduplicate", identity.cluster_count(), started.elapsed());
        progress.inc(1);

        // Silver: outlier annotation
        progress.set_message("outliers");
        let started = Instant::now();
        log_stage_start("outliers", lab_results.len());
        let annotation = OutlierDetector::new(&self.config.outliers).annotate(lab_results);
        log_stage_complete("outliers", annotation.lab_results.len(), started.elapsed());
        progress.inc(1);

        let silver = SilverTables {
            patients,
            diagnoses,
            lab_results: annotation.lab_results,
            medications,
        };

        // Gold
        progress.set_message("features");
        let started = Instant::now();
        log_stage_start("features", identity.cluster_count());
        let aggregation = FeatureAggregator::new(
            &self.lookups,
            &self.config.completeness,
            &self.config.features,
        )
        .aggregate(&silver, &identity, now);
        log_stage_complete("features", aggregation.gold.features.len(), started.elapsed());
        progress.inc(1);

        // Quality
        progress.set_message("quality");
        let started = Instant::now();
        let quality = self.reporter.report(
            &QualityInputs {
                silver: &silver,
                identity: &identity,
                lab_groups: &annotation.groups,
                gold: &aggregation.gold,
                orphans: aggregation.orphans,
            },
            now,
        );
        log_stage_complete("quality", quality.metrics.len(), started.elapsed());
        progress.inc(1);
        finish_progress_bar(&progress, Some("done"));

        Ok(PipelineOutput {
            bronze,
            silver,
            identity,
            lab_groups: annotation.groups,
            gold: aggregation.gold,
            orphans: aggregation.orphans,
            quality,
        })
    }
}
