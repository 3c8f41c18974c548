//! Patient identity resolution
//!
//! Standardized patient rows are grouped into identity clusters. Candidate
//! pairs come from blocks, are scored in parallel, and are merged in a single
//! union-find pass once every block has been scored. Keys are assigned only
//! after that pass so they never depend on scheduling.

pub mod blocking;
pub mod similarity;
pub mod union_find;

pub use blocking::{BlockKey, IdentityFields, build_blocks, normalize_name};
pub use similarity::PairScorer;
pub use union_find::UnionFind;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::config::DeduplicationConfig;
use crate::models::{PatientKey, SilverPatient, StandardizedPatient};

/// A set of patient rows judged to be the same person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientIdentityCluster {
    pub patient_key: PatientKey,
    /// Raw id of the canonical member
    pub canonical_id: i64,
    /// Row index of the canonical member
    pub canonical_index: usize,
    /// Row indices of all members, ascending
    pub member_indices: Vec<usize>,
    /// Raw ids of all members, in row order
    pub member_ids: Vec<i64>,
    /// True when no member carried complete identity fields
    pub incomplete_identity: bool,
}

impl PatientIdentityCluster {
    /// Number of member rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.member_indices.len()
    }

    /// Always false; clusters have at least one member
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.member_indices.is_empty()
    }

    /// Number of members other than the canonical one
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.len().saturating_sub(1)
    }
}

/// Outcome of identity resolution over a patient table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityResolution {
    clusters: Vec<PatientIdentityCluster>,
    key_by_raw_id: FxHashMap<i64, PatientKey>,
    cluster_by_row: Vec<usize>,
    identity_complete_by_row: Vec<bool>,
}

impl IdentityResolution {
    /// Clusters ordered by patient key
    #[must_use]
    pub fn clusters(&self) -> &[PatientIdentityCluster] {
        &self.clusters
    }

    /// Number of clusters
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Patient key that a raw patient id resolves to
    #[must_use]
    pub fn key_for(&self, raw_id: i64) -> Option<PatientKey> {
        self.key_by_raw_id.get(&raw_id).copied()
    }

    /// Cluster with the given key
    #[must_use]
    pub fn cluster(&self, key: PatientKey) -> Option<&PatientIdentityCluster> {
        let position = usize::try_from(key.0).ok()?.checked_sub(1)?;
        self.clusters.get(position)
    }

    /// Number of rows that are not the canonical member of their cluster
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.clusters
            .iter()
            .map(PatientIdentityCluster::duplicate_count)
            .sum()
    }

    /// Number of patient rows without usable identity fields
    ///
    /// Counted per row: an incomplete row that shares its raw id with a
    /// complete one is merged into that cluster but still counted here.
    #[must_use]
    pub fn incomplete_count(&self) -> usize {
        self.identity_complete_by_row
            .iter()
            .filter(|complete| !**complete)
            .count()
    }

    /// Attach cluster keys to the rows this resolution was computed from
    ///
    /// `patients` must be the table passed to [`DedupEngine::resolve`]; rows
    /// beyond the resolved range are dropped.
    #[must_use]
    pub fn assign(&self, patients: Vec<StandardizedPatient>) -> Vec<SilverPatient> {
        patients
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let cluster = &self.clusters[*self.cluster_by_row.get(index)?];
                Some(SilverPatient {
                    patient_key: cluster.patient_key,
                    is_duplicate: cluster.canonical_index != index,
                    identity_complete: self.identity_complete_by_row[index],
                    record,
                })
            })
            .collect()
    }
}

/// Clusters patient rows into identities
#[derive(Debug, Clone)]
pub struct DedupEngine<'a> {
    config: &'a DeduplicationConfig,
}

impl<'a> DedupEngine<'a> {
    #[must_use]
    pub const fn new(config: &'a DeduplicationConfig) -> Self {
        Self { config }
    }

    /// Resolve identities over the whole patient table
    #[must_use]
    pub fn resolve(&self, patients: &[StandardizedPatient]) -> IdentityResolution {
        let identities: Vec<IdentityFields> = patients
            .par_iter()
            .enumerate()
            .filter_map(|(index, patient)| IdentityFields::extract(index, patient))
            .collect();

        let mut identity_complete_by_row = vec![false; patients.len()];
        for identity in &identities {
            identity_complete_by_row[identity.index] = true;
        }

        let blocks = build_blocks(&identities);
        log::debug!(
            "Built {} blocks over {} complete identities",
            blocks.len(),
            identities.len()
        );

        let scorer = PairScorer::new(self.config);
        let edges: Vec<(usize, usize)> = blocks
            .par_iter()
            .flat_map_iter(|(_, block)| {
                let mut matches = Vec::new();
                for (i, &left) in block.iter().enumerate() {
                    for &right in &block[i + 1..] {
                        let (a, b) = (&identities[left], &identities[right]);
                        if scorer.is_match(a, b) {
                            matches.push((a.index, b.index));
                        }
                    }
                }
                matches
            })
            .collect();

        let mut forest = UnionFind::new(patients.len());
        for (a, b) in &edges {
            forest.union(*a, *b);
        }

        let mut first_row_by_id: FxHashMap<i64, usize> = FxHashMap::default();
        for (index, patient) in patients.iter().enumerate() {
            match first_row_by_id.get(&patient.patient_id) {
                Some(&first) => {
                    forest.union(first, index);
                }
                None => {
                    first_row_by_id.insert(patient.patient_id, index);
                }
            }
        }

        let resolution =
            Self::assign_keys(patients, forest.groups(), identity_complete_by_row);
        log::info!(
            "Resolved {} patient rows into {} identities ({} fuzzy matches, {} duplicates)",
            patients.len(),
            resolution.cluster_count(),
            edges.len(),
            resolution.duplicate_count()
        );
        resolution
    }

    fn assign_keys(
        patients: &[StandardizedPatient],
        groups: Vec<Vec<usize>>,
        identity_complete_by_row: Vec<bool>,
    ) -> IdentityResolution {
        let mut clusters: Vec<PatientIdentityCluster> = groups
            .into_iter()
            .filter_map(|member_indices| {
                let canonical_index = member_indices
                    .iter()
                    .copied()
                    .min_by_key(|&index| (patients[index].patient_id, index))?;
                let member_ids = member_indices
                    .iter()
                    .map(|&index| patients[index].patient_id)
                    .collect();
                let incomplete_identity = member_indices
                    .iter()
                    .all(|&index| !identity_complete_by_row[index]);
                Some(PatientIdentityCluster {
                    patient_key: PatientKey(0),
                    canonical_id: patients[canonical_index].patient_id,
                    canonical_index,
                    member_indices,
                    member_ids,
                    incomplete_identity,
                })
            })
            .collect();

        clusters.sort_unstable_by_key(|c| (c.canonical_id, c.canonical_index));

        let mut key_by_raw_id = FxHashMap::default();
        let mut cluster_by_row = vec![0; patients.len()];
        for (position, cluster) in clusters.iter_mut().enumerate() {
            cluster.patient_key = PatientKey(position as u64 + 1);
            for (&index, &raw_id) in cluster.member_indices.iter().zip(&cluster.member_ids) {
                cluster_by_row[index] = position;
                key_by_raw_id.insert(raw_id, cluster.patient_key);
            }
        }

        IdentityResolution {
            clusters,
            key_by_raw_id,
            cluster_by_row,
            identity_complete_by_row,
        }
    }
}
