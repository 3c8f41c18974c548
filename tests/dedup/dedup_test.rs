#[cfg(test)]
mod tests {
    use readmission_pipeline::config::DeduplicationConfig;
    use readmission_pipeline::dedup::{DedupEngine, IdentityFields, PairScorer};
    use readmission_pipeline::lookup::LookupTables;
    use readmission_pipeline::models::{RawPatient, StandardizedPatient};
    use readmission_pipeline::standardize::StandardizationEngine;

    use crate::utils::{self, DUPLICATES, IDENTITIES};

    fn standardize(rows: &[RawPatient]) -> Vec<StandardizedPatient> {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);
        rows.iter().map(|row| engine.patient(row)).collect()
    }

    #[test]
    fn test_clusters_partition_all_rows() {
        let patients = standardize(&utils::patients());
        let config = DeduplicationConfig::default();
        let resolution = DedupEngine::new(&config).resolve(&patients);

        assert_eq!(resolution.cluster_count(), IDENTITIES);
        assert_eq!(resolution.duplicate_count(), DUPLICATES);

        let mut seen: Vec<usize> = resolution
            .clusters()
            .iter()
            .flat_map(|c| c.member_indices.iter().copied())
            .collect();
        assert_eq!(seen.len(), patients.len());
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), patients.len());

        for cluster in resolution.clusters() {
            assert!(cluster.member_indices.contains(&cluster.canonical_index));
            assert_eq!(
                cluster.canonical_id,
                *cluster.member_ids.iter().min().unwrap()
            );
        }
    }

    #[test]
    fn test_duplicates_share_key_with_original() {
        let patients = standardize(&utils::patients());
        let config = DeduplicationConfig::default();
        let resolution = DedupEngine::new(&config).resolve(&patients);

        for k in 0..DUPLICATES {
            let original = utils::patient_id(utils::duplicated_identity(k));
            let duplicate = (IDENTITIES + 1 + k) as i64;
            assert_eq!(
                resolution.key_for(original),
                resolution.key_for(duplicate),
                "duplicate row {k}"
            );
            let cluster = resolution
                .key_for(original)
                .and_then(|key| resolution.cluster(key))
                .unwrap();
            assert_eq!(cluster.canonical_id, original);
        }

        let silver = resolution.assign(patients);
        assert_eq!(silver.iter().filter(|p| p.is_duplicate).count(), DUPLICATES);
        assert!(silver[..IDENTITIES].iter().all(|p| !p.is_duplicate));
    }

    #[test]
    fn test_keys_are_dense_and_ordered_by_canonical_id() {
        let patients = standardize(&utils::patients());
        let config = DeduplicationConfig::default();
        let resolution = DedupEngine::new(&config).resolve(&patients);

        for (position, cluster) in resolution.clusters().iter().enumerate() {
            assert_eq!(cluster.patient_key.0, position as u64 + 1);
        }
        assert!(
            resolution
                .clusters()
                .windows(2)
                .all(|w| w[0].canonical_id < w[1].canonical_id)
        );
    }

    #[test]
    fn test_merges_are_transitive() {
        let config = DeduplicationConfig {
            name_similarity_threshold: 0.95,
            ..DeduplicationConfig::default()
        };
        let rows = vec![
            utils::raw_patient(1, "Alexandra", "Novak", "1970-02-02"),
            utils::raw_patient(2, "Alexandr", "Novak", "1970-02-02"),
            utils::raw_patient(3, "Alexand", "Novak", "1970-02-02"),
            utils::raw_patient(4, "Alexan", "Novak", "1970-02-02"),
        ];
        let patients = standardize(&rows);

        let first = IdentityFields::extract(0, &patients[0]).unwrap();
        let last = IdentityFields::extract(3, &patients[3]).unwrap();
        assert!(!PairScorer::new(&config).is_match(&first, &last));

        let resolution = DedupEngine::new(&config).resolve(&patients);
        assert_eq!(resolution.cluster_count(), 1);
        assert_eq!(resolution.clusters()[0].canonical_id, 1);
    }

    #[test]
    fn test_different_birth_dates_stay_apart() {
        let rows = vec![
            utils::raw_patient(1, "Anna", "Berg", "1970-02-02"),
            utils::raw_patient(2, "Anna", "Berg", "1970-02-03"),
        ];
        let patients = standardize(&rows);
        let config = DeduplicationConfig::default();
        let resolution = DedupEngine::new(&config).resolve(&patients);

        assert_eq!(resolution.cluster_count(), 2);
    }

    #[test]
    fn test_missing_birth_date_is_incomplete_singleton() {
        let mut incomplete = utils::raw_patient(1, "Anna", "Berg", "1970-02-02");
        incomplete.date_of_birth = Some("not a date".to_string());
        let rows = vec![incomplete, utils::raw_patient(2, "Anna", "Berg", "1970-02-02")];
        let patients = standardize(&rows);
        let config = DeduplicationConfig::default();
        let resolution = DedupEngine::new(&config).resolve(&patients);

        assert_eq!(resolution.cluster_count(), 2);
        assert_eq!(resolution.incomplete_count(), 1);
        let silver = resolution.assign(patients);
        assert!(!silver[0].identity_complete);
        assert!(silver[1].identity_complete);
    }
}
