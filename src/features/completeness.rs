//! Completeness gate: decides which canonical patients reach the feature table

use chrono::{Datelike, NaiveDate};

use crate::config::CompletenessPolicy;
use crate::dedup::PatientIdentityCluster;
use crate::models::{ExclusionReason, Gender, StandardizedPatient};

/// Demographics of a patient that passed the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demographics {
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    pub age: i32,
    pub length_of_stay: i32,
    pub gender: Gender,
    pub readmitted: bool,
}

/// Completed years between `birth` and `on`
#[must_use]
pub fn age_at(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

/// Applies a [`CompletenessPolicy`] to canonical records
#[derive(Debug, Clone, Copy)]
pub struct CompletenessGate<'a> {
    policy: &'a CompletenessPolicy,
}

impl<'a> CompletenessGate<'a> {
    #[must_use]
    pub const fn new(policy: &'a CompletenessPolicy) -> Self {
        Self { policy }
    }

    /// Check the canonical record of a cluster, returning the first failing reason
    pub fn evaluate(
        &self,
        cluster: &PatientIdentityCluster,
        record: &StandardizedPatient,
    ) -> Result<Demographics, ExclusionReason> {
        if cluster.incomplete_identity && self.policy.exclude_incomplete_identity {
            return Err(ExclusionReason::IncompleteIdentity);
        }

        let admission_date = record
            .admission_date
            .get()
            .ok_or(ExclusionReason::MissingAdmissionDate)?;
        let discharge_date = record
            .discharge_date
            .get()
            .ok_or(ExclusionReason::MissingDischargeDate)?;

        let days = (discharge_date - admission_date).num_days();
        if days < 0 {
            return Err(ExclusionReason::NegativeLengthOfStay);
        }
        if days == 0 && !self.policy.allow_zero_length_of_stay {
            return Err(ExclusionReason::ZeroLengthOfStay);
        }
        let length_of_stay =
            i32::try_from(days).map_err(|_| ExclusionReason::NegativeLengthOfStay)?;

        let age = record
            .date_of_birth
            .get()
            .map(|birth| age_at(birth, admission_date))
            .or(record.reported_age)
            .filter(|age| (self.policy.min_age..=self.policy.max_age).contains(age))
            .ok_or(ExclusionReason::InvalidAge)?;

        if self.policy.require_gender && record.gender == Gender::Unknown {
            return Err(ExclusionReason::MissingGender);
        }

        let readmitted = match record.readmitted_30_days {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(ExclusionReason::MissingTarget),
        };

        Ok(Demographics {
            admission_date,
            discharge_date,
            age,
            length_of_stay,
            gender: record.gender,
            readmitted,
        })
    }
}
