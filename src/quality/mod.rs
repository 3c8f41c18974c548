//! Data quality metrics over every stage of a pipeline run
//!
//! Each metric is computed independently. A metric that cannot be computed,
//! such as a rate over an empty table, is recorded as a failure and the
//! remaining metrics are still reported.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dedup::IdentityResolution;
use crate::error::IssueKind;
use crate::features::OrphanCounts;
use crate::models::{
    Exclusion, ExclusionReason, FieldStatus, GoldTables, OutlierStatus, SilverTables,
};
use crate::outlier::GroupStatistics;

/// One named measurement of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetric {
    pub metric: String,
    pub value: f64,
    pub generated_at: DateTime<Utc>,
}

/// Why a metric could not be computed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    #[error("denominator '{0}' is zero")]
    EmptyDenominator(&'static str),
}

/// A metric that failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFailure {
    pub metric: String,
    pub reason: String,
}

/// Everything the reporter reads; nothing here is modified
#[derive(Debug, Clone, Copy)]
pub struct QualityInputs<'r> {
    pub silver: &'r SilverTables,
    pub identity: &'r IdentityResolution,
    pub lab_groups: &'r [GroupStatistics],
    pub gold: &'r GoldTables,
    pub orphans: OrphanCounts,
}

/// Quality report of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub generated_at: DateTime<Utc>,
    pub metrics: Vec<QualityMetric>,
    pub failures: Vec<MetricFailure>,
    pub exclusions: Vec<Exclusion>,
}

impl QualityReport {
    /// Value of a metric by name
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.metric == name)
            .map(|m| m.value)
    }

    /// Failure recorded for a metric, if any
    #[must_use]
    pub fn failure(&self, name: &str) -> Option<&MetricFailure> {
        self.failures.iter().find(|f| f.metric == name)
    }
}

type MetricResult = Result<f64, MetricError>;
type MetricFn = Box<dyn Fn(&QualityInputs<'_>) -> MetricResult + Send + Sync>;

/// A named metric computation
pub struct MetricDefinition {
    name: String,
    compute: MetricFn,
}

impl MetricDefinition {
    pub fn new(
        name: impl Into<String>,
        compute: impl Fn(&QualityInputs<'_>) -> MetricResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            compute: Box::new(compute),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_value(n: usize) -> f64 {
    n as f64
}

fn count(n: usize) -> MetricResult {
    Ok(as_value(n))
}

fn rate(numerator: usize, denominator: usize, denominator_name: &'static str) -> MetricResult {
    if denominator == 0 {
        return Err(MetricError::EmptyDenominator(denominator_name));
    }
    Ok(as_value(numerator) / as_value(denominator))
}

fn date_parse_failures(silver: &SilverTables) -> usize {
    let patients = silver.patients.iter().flat_map(|p| {
        [
            p.record.date_of_birth.status,
            p.record.admission_date.status,
            p.record.discharge_date.status,
        ]
    });
    let labs = silver.lab_results.iter().map(|l| l.lab.test_date.status);
    let medications = silver
        .medications
        .iter()
        .flat_map(|m| [m.start_date.status, m.end_date.status]);
    patients
        .chain(labs)
        .chain(medications)
        .filter(|status| *status == FieldStatus::Invalid)
        .count()
}

fn lab_status_count(silver: &SilverTables, status: OutlierStatus) -> usize {
    silver
        .lab_results
        .iter()
        .filter(|l| l.outlier == status)
        .count()
}

fn exclusion_count(gold: &GoldTables, reason: ExclusionReason) -> usize {
    gold.exclusions.iter().filter(|e| e.reason == reason).count()
}

fn issue_count(inputs: &QualityInputs<'_>, kind: IssueKind) -> usize {
    match kind {
        IssueKind::ParseFailure => date_parse_failures(inputs.silver),
        IssueKind::StandardizationMiss => {
            inputs
                .silver
                .diagnoses
                .iter()
                .filter(|d| d.code.is_unrecognized())
                .count()
                + inputs
                    .silver
                    .medications
                    .iter()
                    .filter(|m| m.name.is_unrecognized())
                    .count()
        }
        IssueKind::IncompleteIdentity => inputs.identity.incomplete_count(),
        IssueKind::CompletenessGateFailure => inputs.gold.exclusions.len(),
        IssueKind::InsufficientSampleForOutlierTest => {
            inputs.lab_groups.iter().filter(|g| !g.is_evaluated()).count()
        }
    }
}

/// The fixed metric set
#[must_use]
pub fn standard_metrics() -> Vec<MetricDefinition> {
    let mut metrics = vec![
        MetricDefinition::new("patients_total", |i| count(i.silver.patients.len())),
        MetricDefinition::new("patients_unique", |i| count(i.identity.cluster_count())),
        MetricDefinition::new("patients_duplicates", |i| count(i.identity.duplicate_count())),
        MetricDefinition::new("patients_duplicate_rate", |i| {
            rate(
                i.identity.duplicate_count(),
                i.silver.patients.len(),
                "patients_total",
            )
        }),
        MetricDefinition::new("patients_incomplete_identity", |i| {
            count(i.identity.incomplete_count())
        }),
        MetricDefinition::new("patients_retained", |i| count(i.gold.features.len())),
        MetricDefinition::new("patients_excluded", |i| count(i.gold.exclusions.len())),
        MetricDefinition::new("patients_readmission_rate", |i| {
            let readmitted = i.gold.features.iter().filter(|f| f.is_readmitted()).count();
            rate(readmitted, i.gold.features.len(), "patients_retained")
        }),
        MetricDefinition::new("diagnoses_total", |i| count(i.silver.diagnoses.len())),
        MetricDefinition::new("diagnoses_codes_standardized", |i| {
            count(i.silver.diagnoses.iter().filter(|d| d.code.was_changed).count())
        }),
        MetricDefinition::new("diagnoses_invalid_codes", |i| {
            count(i.silver.diagnoses.iter().filter(|d| !d.code.is_valid()).count())
        }),
        MetricDefinition::new("diagnoses_orphaned", |i| count(i.orphans.diagnoses)),
        MetricDefinition::new("labs_total", |i| count(i.silver.lab_results.len())),
        MetricDefinition::new("labs_outliers", |i| {
            count(lab_status_count(i.silver, OutlierStatus::Outlier))
        }),
        MetricDefinition::new("labs_outlier_rate", |i| {
            let outliers = lab_status_count(i.silver, OutlierStatus::Outlier);
            let evaluated = outliers + lab_status_count(i.silver, OutlierStatus::Inlier);
            rate(outliers, evaluated, "labs_evaluated")
        }),
        MetricDefinition::new("labs_not_evaluated", |i| {
            count(lab_status_count(i.silver, OutlierStatus::NotEvaluated))
        }),
        MetricDefinition::new("labs_invalid_values", |i| {
            count(i.silver.lab_results.iter().filter(|l| !l.value_valid).count())
        }),
        MetricDefinition::new("labs_orphaned", |i| count(i.orphans.lab_results)),
        MetricDefinition::new("medications_total", |i| count(i.silver.medications.len())),
        MetricDefinition::new("medications_names_standardized", |i| {
            count(i.silver.medications.iter().filter(|m| m.name.was_changed).count())
        }),
        MetricDefinition::new("medications_unrecognized", |i| {
            count(
                i.silver
                    .medications
                    .iter()
                    .filter(|m| m.name.is_unrecognized())
                    .count(),
            )
        }),
        MetricDefinition::new("medications_orphaned", |i| count(i.orphans.medications)),
        MetricDefinition::new("dates_parse_failures", |i| count(date_parse_failures(i.silver))),
    ];

    metrics.extend(IssueKind::ALL.into_iter().map(|kind| {
        MetricDefinition::new(kind.metric_name(), move |i| count(issue_count(i, kind)))
    }));
    metrics
}

/// Evaluates metric definitions against the outputs of a run
#[derive(Debug)]
pub struct QualityReporter {
    definitions: Vec<MetricDefinition>,
}

impl Default for QualityReporter {
    fn default() -> Self {
        Self::new(standard_metrics())
    }
}

impl QualityReporter {
    #[must_use]
    pub fn new(definitions: Vec<MetricDefinition>) -> Self {
        Self { definitions }
    }

    /// Compute every metric; failures are collected, never propagated
    #[must_use]
    pub fn report(&self, inputs: &QualityInputs<'_>, generated_at: DateTime<Utc>) -> QualityReport {
        let outcomes: Vec<(String, MetricResult)> = self
            .definitions
            .par_iter()
            .map(|definition| (definition.name.clone(), (definition.compute)(inputs)))
            .collect();

        let mut metrics = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (metric, outcome) in outcomes {
            match outcome {
                Ok(value) => metrics.push(QualityMetric {
                    metric,
                    value,
                    generated_at,
                }),
                Err(error) => {
                    log::warn!("Quality metric '{metric}' failed: {error}");
                    failures.push(MetricFailure {
                        metric,
                        reason: error.to_string(),
                    });
                }
            }
        }

        // One metric per exclusion reason that occurred
        for reason in ExclusionReason::ALL {
            let excluded = exclusion_count(inputs.gold, reason);
            if excluded > 0 {
                metrics.push(QualityMetric {
                    metric: format!("excluded_{}", reason.code()),
                    value: as_value(excluded),
                    generated_at,
                });
            }
        }

        log::info!(
            "Computed {} quality metrics ({} failed)",
            metrics.len(),
            failures.len()
        );

        QualityReport {
            generated_at,
            metrics,
            failures,
            exclusions: inputs.gold.exclusions.clone(),
        }
    }
}
