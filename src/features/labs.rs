//! Per-panel lab means

use chrono::NaiveDate;

use crate::models::{LabTest, SilverLabResult};

/// Round to two decimals
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the values after sorting them, so the result does not depend on row order
#[must_use]
pub fn sorted_mean(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}

/// Whether a lab row falls inside the stay, bounds included
#[must_use]
pub fn within_stay(lab: &SilverLabResult, admission: NaiveDate, discharge: NaiveDate) -> bool {
    lab.lab
        .test_date
        .get()
        .is_some_and(|date| (admission..=discharge).contains(&date))
}

/// Rounded mean of one panel over the given rows
///
/// Valid non-outlier values are used; when every valid value of the panel is
/// an outlier, all of them are used instead. Returns `None` without values.
#[must_use]
pub fn panel_mean(labs: &[&SilverLabResult], panel: &LabTest) -> Option<f64> {
    let candidates: Vec<(f64, bool)> = labs
        .iter()
        .filter(|lab| lab.value_valid && lab.lab.test.as_ref() == Some(panel))
        .filter_map(|lab| {
            lab.lab
                .test_value
                .filter(|v| v.is_finite())
                .map(|v| (v, lab.is_outlier()))
        })
        .collect();

    let inliers: Vec<f64> = candidates
        .iter()
        .filter(|(_, outlier)| !outlier)
        .map(|(v, _)| *v)
        .collect();
    let values = if inliers.is_empty() {
        candidates.into_iter().map(|(v, _)| v).collect()
    } else {
        inliers
    };
    sorted_mean(values).map(round2)
}
