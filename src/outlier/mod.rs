//! IQR-based outlier annotation of lab results
//!
//! Values are grouped by lab test. Each group gets its own quartiles, and a
//! value strictly outside `[Q1 - k*IQR, Q3 + k*IQR]` is an outlier. Rows are
//! annotated, never removed or changed.

use itertools::Itertools;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::config::OutlierConfig;
use crate::models::{LabTest, OutlierStatus, SilverLabResult, StandardizedLabResult};

/// Quantile `p` of an ascending slice, interpolating linearly between ranks
///
/// Returns `None` for an empty slice or `p` outside `[0, 1]`.
#[must_use]
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    let fraction = h - lower as f64;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Inlier interval of one test group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Bounds of an ascending slice for the multiplier `k`
    #[must_use]
    pub fn from_sorted(sorted: &[f64], k: f64) -> Option<Self> {
        let q1 = quantile(sorted, 0.25)?;
        let q3 = quantile(sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: iqr.mul_add(-k, q1),
            upper: iqr.mul_add(k, q3),
        })
    }

    /// Interquartile range
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Classify a single value against the interval
    #[must_use]
    pub fn classify(&self, value: f64) -> OutlierStatus {
        if value < self.lower || value > self.upper {
            OutlierStatus::Outlier
        } else {
            OutlierStatus::Inlier
        }
    }
}

/// Per-group summary, kept for the quality report
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStatistics {
    pub test: LabTest,
    /// Rows in the group, including rows without a value
    pub rows: usize,
    /// Finite values the quartiles were computed over
    pub sample_size: usize,
    /// `None` when the group was below the minimum sample size
    pub bounds: Option<IqrBounds>,
    pub outliers: usize,
}

impl GroupStatistics {
    /// Whether the IQR rule was applied to this group
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        self.bounds.is_some()
    }
}

/// Annotated lab rows plus the statistics of every group
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierAnnotation {
    /// Lab rows in input order
    pub lab_results: Vec<SilverLabResult>,
    /// Groups ordered by test
    pub groups: Vec<GroupStatistics>,
}

impl OutlierAnnotation {
    /// Groups skipped for lack of samples
    pub fn skipped_groups(&self) -> impl Iterator<Item = &GroupStatistics> {
        self.groups.iter().filter(|g| !g.is_evaluated())
    }
}

/// Applies the IQR rule per lab test
#[derive(Debug, Clone)]
pub struct OutlierDetector<'a> {
    config: &'a OutlierConfig,
    non_negative: FxHashSet<LabTest>,
}

impl<'a> OutlierDetector<'a> {
    #[must_use]
    pub fn new(config: &'a OutlierConfig) -> Self {
        let non_negative = config
            .non_negative_tests
            .iter()
            .map(|name| LabTest::from_name(name))
            .collect();
        Self {
            config,
            non_negative,
        }
    }

    /// Whether a value is acceptable for its test, regardless of outlier status
    #[must_use]
    pub fn is_value_valid(&self, test: Option<&LabTest>, value: Option<f64>) -> bool {
        match (test, value) {
            (Some(test), Some(value)) if self.non_negative.contains(test) => {
                value.is_finite() && value >= 0.0
            }
            _ => true,
        }
    }

    /// Statistics of one group, given the row indices belonging to it
    fn group_statistics(
        &self,
        test: LabTest,
        indices: &[usize],
        labs: &[StandardizedLabResult],
    ) -> GroupStatistics {
        let mut values: Vec<f64> = indices
            .iter()
            .filter_map(|&i| labs[i].test_value)
            .filter(|v| v.is_finite())
            .collect();
        values.sort_unstable_by(f64::total_cmp);

        let bounds = if values.len() >= self.config.min_sample_size {
            IqrBounds::from_sorted(&values, self.config.iqr_multiplier)
        } else {
            None
        };
        let outliers = bounds.map_or(0, |b| {
            values
                .iter()
                .filter(|&&v| b.classify(v) == OutlierStatus::Outlier)
                .count()
        });

        match &bounds {
            Some(b) => log::debug!(
                "{test}: n={} Q1={:.3} Q3={:.3} bounds=[{:.3}, {:.3}] outliers={outliers}",
                values.len(),
                b.q1,
                b.q3,
                b.lower,
                b.upper
            ),
            None => log::warn!(
                "{test}: {} values below minimum sample size {}, not evaluated",
                values.len(),
                self.config.min_sample_size
            ),
        }

        GroupStatistics {
            test,
            rows: indices.len(),
            sample_size: values.len(),
            bounds,
            outliers,
        }
    }

    /// Annotate every lab row with its outlier status and validity flag
    #[must_use]
    pub fn annotate(&self, labs: Vec<StandardizedLabResult>) -> OutlierAnnotation {
        let grouped: Vec<(LabTest, Vec<usize>)> = labs
            .iter()
            .enumerate()
            .filter_map(|(index, lab)| lab.test.clone().map(|test| (test, index)))
            .into_group_map()
            .into_iter()
            .sorted_unstable_by(|a, b| a.0.cmp(&b.0))
            .collect();

        let groups: Vec<GroupStatistics> = grouped
            .par_iter()
            .map(|(test, indices)| self.group_statistics(test.clone(), indices, &labs))
            .collect();

        let mut statuses = vec![OutlierStatus::NotEvaluated; labs.len()];
        for ((_, indices), stats) in grouped.iter().zip(&groups) {
            let Some(bounds) = stats.bounds else {
                continue;
            };
            for &index in indices {
                if let Some(value) = labs[index].test_value.filter(|v| v.is_finite()) {
                    statuses[index] = bounds.classify(value);
                }
            }
        }

        let lab_results: Vec<SilverLabResult> = labs
            .into_par_iter()
            .zip(statuses)
            .map(|(lab, outlier)| {
                let value_valid = self.is_value_valid(lab.test.as_ref(), lab.test_value);
                SilverLabResult {
                    lab,
                    outlier,
                    value_valid,
                }
            })
            .collect();

        let flagged = groups.iter().map(|g| g.outliers).sum::<usize>();
        log::info!(
            "Annotated {} lab results in {} groups: {flagged} outliers",
            lab_results.len(),
            groups.len()
        );

        OutlierAnnotation {
            lab_results,
            groups,
        }
    }
}
