//! Gold-layer feature aggregation
//!
//! Child tables are indexed by patient key once, then every identity cluster
//! is turned into either a feature vector or an exclusion in parallel.

pub mod completeness;
pub mod labs;

pub use completeness::{CompletenessGate, Demographics, age_at};
pub use labs::{panel_mean, round2, sorted_mean, within_stay};

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::{CompletenessPolicy, FeatureConfig};
use crate::dedup::{IdentityResolution, PatientIdentityCluster};
use crate::lookup::{ChronicCondition, DrugClass, LookupTables};
use crate::models::{
    Exclusion, GoldTables, LabTest, PatientDiagnosisCodes, PatientFeatureVector, PatientKey,
    SilverDiagnosis, SilverLabResult, SilverMedication, SilverTables,
};

/// Child rows whose raw patient id resolved to no identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrphanCounts {
    pub diagnoses: usize,
    pub lab_results: usize,
    pub medications: usize,
}

/// Gold tables plus the orphan counts found while joining
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub gold: GoldTables,
    pub orphans: OrphanCounts,
}

/// Rows of one child table grouped by patient key
struct KeyIndex<'s, T> {
    rows: FxHashMap<PatientKey, Vec<&'s T>>,
    orphans: usize,
}

impl<'s, T> KeyIndex<'s, T> {
    fn build(rows: &'s [T], identity: &IdentityResolution, patient_id: impl Fn(&T) -> i64) -> Self {
        let mut index: FxHashMap<PatientKey, Vec<&'s T>> = FxHashMap::default();
        let mut orphans = 0;
        for row in rows {
            match identity.key_for(patient_id(row)) {
                Some(key) => index.entry(key).or_default().push(row),
                None => orphans += 1,
            }
        }
        Self {
            rows: index,
            orphans,
        }
    }

    fn get(&self, key: PatientKey) -> &[&'s T] {
        self.rows.get(&key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Joins the silver tables into one feature vector per retained patient
#[derive(Debug, Clone, Copy)]
pub struct FeatureAggregator<'a> {
    lookups: &'a LookupTables,
    gate: CompletenessGate<'a>,
    config: &'a FeatureConfig,
}

impl<'a> FeatureAggregator<'a> {
    #[must_use]
    pub const fn new(
        lookups: &'a LookupTables,
        policy: &'a CompletenessPolicy,
        config: &'a FeatureConfig,
    ) -> Self {
        Self {
            lookups,
            gate: CompletenessGate::new(policy),
            config,
        }
    }

    /// Build the gold tables
    ///
    /// `silver.patients` must be in the row order `identity` was resolved on.
    #[must_use]
    pub fn aggregate(
        &self,
        silver: &SilverTables,
        identity: &IdentityResolution,
        generated_at: DateTime<Utc>,
    ) -> Aggregation {
        let diagnoses = KeyIndex::build(&silver.diagnoses, identity, |d| d.patient_id);
        let labs = KeyIndex::build(&silver.lab_results, identity, |l| l.lab.patient_id);
        let medications = KeyIndex::build(&silver.medications, identity, |m| m.patient_id);

        let outcomes: Vec<Result<(PatientFeatureVector, PatientDiagnosisCodes), Exclusion>> =
            identity
                .clusters()
                .par_iter()
                .map(|cluster| {
                    self.patient_features(
                        cluster,
                        silver,
                        diagnoses.get(cluster.patient_key),
                        labs.get(cluster.patient_key),
                        medications.get(cluster.patient_key),
                        generated_at,
                    )
                })
                .collect();

        let mut features = Vec::with_capacity(outcomes.len());
        let mut diagnosis_codes = Vec::with_capacity(outcomes.len());
        let mut exclusions = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok((vector, codes)) => {
                    features.push(vector);
                    diagnosis_codes.push(codes);
                }
                Err(exclusion) => exclusions.push(exclusion),
            }
        }

        let orphans = OrphanCounts {
            diagnoses: diagnoses.orphans,
            lab_results: labs.orphans,
            medications: medications.orphans,
        };
        if orphans != OrphanCounts::default() {
            log::warn!(
                "Orphaned rows: {} diagnoses, {} lab results, {} medications",
                orphans.diagnoses,
                orphans.lab_results,
                orphans.medications
            );
        }
        log::info!(
            "Generated {} feature rows, excluded {} patients",
            features.len(),
            exclusions.len()
        );

        Aggregation {
            gold: GoldTables {
                features,
                diagnosis_codes,
                exclusions,
            },
            orphans,
        }
    }

    fn patient_features(
        &self,
        cluster: &PatientIdentityCluster,
        silver: &SilverTables,
        diagnoses: &[&SilverDiagnosis],
        labs: &[&SilverLabResult],
        medications: &[&SilverMedication],
        generated_at: DateTime<Utc>,
    ) -> Result<(PatientFeatureVector, PatientDiagnosisCodes), Exclusion> {
        let record = &silver.patients[cluster.canonical_index].record;
        let demographics = self.gate.evaluate(cluster, record).map_err(|reason| Exclusion {
            patient_key: cluster.patient_key,
            original_patient_id: cluster.canonical_id,
            reason,
        })?;

        // Diagnoses
        let codes: BTreeSet<&str> = diagnoses
            .iter()
            .filter(|d| d.code.is_valid())
            .filter_map(|d| d.code.value().map(String::as_str))
            .collect();
        let conditions: FxHashSet<ChronicCondition> = codes
            .iter()
            .filter_map(|code| self.lookups.code_groups.condition_for(code))
            .collect();
        let has = |condition| u8::from(conditions.contains(&condition));
        let num_chronic_conditions = conditions.iter().filter(|c| c.counts_as_chronic()).count();

        // Medications
        let names: BTreeSet<&str> = medications
            .iter()
            .filter_map(|m| m.name.value().map(String::as_str))
            .collect();
        let classes: FxHashSet<DrugClass> = names
            .iter()
            .filter_map(|name| self.lookups.drug_classes.class_of(name))
            .collect();
        let on = |class| u8::from(classes.contains(&class));

        // Labs
        let stay_labs: Vec<&SilverLabResult> = if self.config.restrict_labs_to_stay {
            labs.iter()
                .copied()
                .filter(|lab| {
                    within_stay(lab, demographics.admission_date, demographics.discharge_date)
                })
                .collect()
        } else {
            labs.to_vec()
        };
        let [hemoglobin, glucose, wbc, creatinine, bun] =
            LabTest::REQUIRED.map(|panel| panel_mean(&stay_labs, &panel));

        let vector = PatientFeatureVector {
            patient_key: cluster.patient_key,
            original_patient_id: cluster.canonical_id,
            age: demographics.age,
            gender: demographics.gender.code().to_string(),
            length_of_stay: demographics.length_of_stay,
            num_diagnoses: count(codes.len()),
            num_chronic_conditions: count(num_chronic_conditions),
            has_diabetes: has(ChronicCondition::Diabetes),
            has_heart_disease: has(ChronicCondition::HeartDisease),
            has_copd: has(ChronicCondition::Copd),
            has_ckd: has(ChronicCondition::ChronicKidneyDisease),
            has_anxiety: has(ChronicCondition::Anxiety),
            num_medications: count(names.len()),
            on_metformin: on(DrugClass::Biguanide),
            on_ace_inhibitor: on(DrugClass::AceInhibitor),
            on_statin: on(DrugClass::Statin),
            num_lab_tests: count(stay_labs.len()),
            avg_hemoglobin: hemoglobin,
            avg_glucose: glucose,
            avg_wbc: wbc,
            avg_creatinine: creatinine,
            avg_bun: bun,
            target_readmitted_30_days: u8::from(demographics.readmitted),
            feature_generation_date: generated_at,
        };
        let codes = PatientDiagnosisCodes {
            patient_key: cluster.patient_key,
            codes: codes.into_iter().map(str::to_string).collect(),
        };
        Ok((vector, codes))
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
