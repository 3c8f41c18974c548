#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use readmission_pipeline::models::{
        ExclusionReason, PatientFeatureVector, PatientKey, RawPatient, SourceTables,
    };
    use readmission_pipeline::{Pipeline, PipelineConfig, PipelineOutput};

    use crate::utils::{self, raw_diagnosis, raw_lab, raw_medication, raw_patient};

    fn run(sources: SourceTables) -> PipelineOutput {
        run_with(PipelineConfig::default(), sources)
    }

    fn run_with(config: PipelineConfig, sources: SourceTables) -> PipelineOutput {
        let generated_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Pipeline::new(config).unwrap().run_at(sources, generated_at).unwrap()
    }

    fn patients_only(patients: Vec<RawPatient>) -> SourceTables {
        utils::sources_from(patients, Vec::new(), Vec::new(), Vec::new())
    }

    fn reasons(output: &PipelineOutput) -> Vec<(i64, ExclusionReason)> {
        output
            .gold
            .exclusions
            .iter()
            .map(|e| (e.original_patient_id, e.reason))
            .collect()
    }

    fn feature_for(output: &PipelineOutput, original_id: i64) -> &PatientFeatureVector {
        output
            .gold
            .features
            .iter()
            .find(|f| f.original_patient_id == original_id)
            .unwrap()
    }

    #[test]
    fn test_completeness_gate_reasons() {
        let ok = raw_patient(1, "Anna", "Berg", "1960-01-01");
        let mut negative = raw_patient(2, "Bo", "Dahl", "1961-01-01");
        negative.discharge_date = Some("2024-02-25".to_string());
        let mut no_admission = raw_patient(3, "Carl", "Ek", "1962-01-01");
        no_admission.admission_date = None;
        let mut no_target = raw_patient(4, "Dina", "Falk", "1963-01-01");
        no_target.readmitted_30_days = Some(2);
        let mut no_birth = raw_patient(5, "Eva", "Gran", "1964-01-01");
        no_birth.date_of_birth = None;
        let too_old = raw_patient(6, "Finn", "Holm", "1880-01-01");

        let sources = utils::sources_from(
            vec![ok, negative, no_admission, no_target, no_birth, too_old],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let output = run(sources);

        assert_eq!(output.gold.features.len(), 1);
        assert_eq!(output.gold.features[0].original_patient_id, 1);
        assert_eq!(output.gold.features[0].length_of_stay, 4);
        assert_eq!(output.gold.features[0].age, 64);

        let reasons: Vec<(i64, ExclusionReason)> = output
            .gold
            .exclusions
            .iter()
            .map(|e| (e.original_patient_id, e.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (2, ExclusionReason::NegativeLengthOfStay),
                (3, ExclusionReason::MissingAdmissionDate),
                (4, ExclusionReason::MissingTarget),
                (5, ExclusionReason::IncompleteIdentity),
                (6, ExclusionReason::InvalidAge),
            ]
        );
        assert_eq!(
            output.gold.features.len() + output.gold.exclusions.len(),
            output.identity.cluster_count()
        );
    }

    #[test]
    fn test_diagnosis_features() {
        let codes = ["E11.9", "e11.9", "I50", "J44", "N18.3", "F41.1", "Diabetes"];
        let diagnoses = codes
            .iter()
            .enumerate()
            .map(|(i, code)| raw_diagnosis(i as i64 + 1, 1, code))
            .chain(std::iter::once(raw_diagnosis(100, 77, "E11")))
            .collect();
        let sources = utils::sources_from(
            vec![
                raw_patient(1, "Anna", "Berg", "1960-01-01"),
                raw_patient(2, "Bo", "Dahl", "1961-01-01"),
            ],
            diagnoses,
            Vec::new(),
            Vec::new(),
        );
        let output = run(sources);

        let anna = feature_for(&output, 1);
        assert_eq!(anna.num_diagnoses, 5);
        assert_eq!(anna.num_chronic_conditions, 4);
        assert_eq!(
            (anna.has_diabetes, anna.has_heart_disease, anna.has_copd, anna.has_ckd, anna.has_anxiety),
            (1, 1, 1, 1, 1)
        );
        assert_eq!(
            output.gold.diagnosis_codes[0].codes,
            vec!["E11.9", "F41.1", "I50", "J44", "N18.3"]
        );

        let bo = feature_for(&output, 2);
        assert_eq!(bo.num_diagnoses, 0);
        assert_eq!(bo.has_diabetes, 0);
        assert_eq!(output.orphans.diagnoses, 1);
    }

    #[test]
    fn test_medication_flags_use_drug_classes() {
        let medications = vec![
            raw_medication(1, 1, "Ramipril"),
            raw_medication(2, 1, "pravastatin"),
            raw_medication(3, 1, "metformin hcl"),
            raw_medication(4, 1, "Metformin"),
            raw_medication(5, 2, "Aspirin"),
        ];
        let sources = utils::sources_from(
            vec![
                raw_patient(1, "Anna", "Berg", "1960-01-01"),
                raw_patient(2, "Bo", "Dahl", "1961-01-01"),
            ],
            Vec::new(),
            Vec::new(),
            medications,
        );
        let output = run(sources);

        let anna = feature_for(&output, 1);
        assert_eq!(anna.num_medications, 3);
        assert_eq!((anna.on_metformin, anna.on_ace_inhibitor, anna.on_statin), (1, 1, 1));

        let bo = feature_for(&output, 2);
        assert_eq!(bo.num_medications, 1);
        assert_eq!((bo.on_metformin, bo.on_ace_inhibitor, bo.on_statin), (0, 0, 0));
    }

    #[test]
    fn test_lab_means_skip_outliers_unless_all_are_outliers() {
        let mut labs: Vec<_> = (0..12)
            .map(|i| raw_lab(i + 1, 1, "Glucose", 95.0 + i as f64, "2024-03-02"))
            .collect();
        labs.push(raw_lab(20, 1, "Glucose", 400.0, "2024-03-03"));
        labs.push(raw_lab(21, 2, "GLU", 410.0, "2024-03-02"));
        labs.push(raw_lab(22, 2, "Glucose", 420.0, "2024-03-02"));
        labs.push(raw_lab(23, 1, "Hemoglobin", 13.0, "2024-04-01"));
        let sources = utils::sources_from(
            vec![
                raw_patient(1, "Anna", "Berg", "1960-01-01"),
                raw_patient(2, "Bo", "Dahl", "1961-01-01"),
            ],
            Vec::new(),
            labs,
            Vec::new(),
        );
        let output = run(sources);

        let anna = feature_for(&output, 1);
        assert_eq!(anna.num_lab_tests, 13);
        assert_eq!(anna.avg_glucose, Some(100.5));
        // Drawn after discharge
        assert_eq!(anna.avg_hemoglobin, None);

        let bo = feature_for(&output, 2);
        assert_eq!(bo.num_lab_tests, 2);
        assert_eq!(bo.avg_glucose, Some(415.0));
        assert_eq!(bo.avg_wbc, None);
    }

    #[test]
    fn test_duplicate_rows_feed_canonical_patient() {
        let sources = utils::sources_from(
            vec![
                raw_patient(1, "Anna", "Berg", "1960-01-01"),
                raw_patient(9, "anna", "BERG", "01/01/1960"),
            ],
            vec![raw_diagnosis(1, 1, "E11"), raw_diagnosis(2, 9, "I10")],
            Vec::new(),
            vec![raw_medication(1, 9, "Atorvastatin")],
        );
        let output = run(sources);

        assert_eq!(output.gold.features.len(), 1);
        let anna = &output.gold.features[0];
        assert_eq!(anna.patient_key, PatientKey(1));
        assert_eq!(anna.original_patient_id, 1);
        assert_eq!(anna.num_diagnoses, 2);
        assert_eq!(anna.on_statin, 1);
        assert_eq!(anna.feature_generation_date, output.quality.generated_at);
    }

    #[test]
    fn test_missing_discharge_date_is_excluded() {
        let mut no_discharge = raw_patient(1, "Anna", "Berg", "1960-01-01");
        no_discharge.discharge_date = Some("unknown".to_string());
        let output = run(patients_only(vec![no_discharge]));

        assert!(output.gold.features.is_empty());
        assert_eq!(reasons(&output), vec![(1, ExclusionReason::MissingDischargeDate)]);
    }

    #[test]
    fn test_zero_length_of_stay_follows_policy() {
        let mut same_day = raw_patient(1, "Anna", "Berg", "1960-01-01");
        same_day.discharge_date = same_day.admission_date.clone();

        let output = run(patients_only(vec![same_day.clone()]));
        assert_eq!(output.gold.features.len(), 1);
        assert_eq!(output.gold.features[0].length_of_stay, 0);

        let mut config = PipelineConfig::default();
        config.completeness.allow_zero_length_of_stay = false;
        let output = run_with(config, patients_only(vec![same_day]));
        assert!(output.gold.features.is_empty());
        assert_eq!(reasons(&output), vec![(1, ExclusionReason::ZeroLengthOfStay)]);
    }

    #[test]
    fn test_unknown_gender_follows_policy() {
        let mut unknown = raw_patient(1, "Anna", "Berg", "1960-01-01");
        unknown.gender = Some("X".to_string());

        let output = run(patients_only(vec![unknown.clone()]));
        assert_eq!(output.gold.features.len(), 1);
        assert_eq!(output.gold.features[0].gender, "U");

        let mut config = PipelineConfig::default();
        config.completeness.require_gender = true;
        let output = run_with(config, patients_only(vec![unknown]));
        assert!(output.gold.features.is_empty());
        assert_eq!(reasons(&output), vec![(1, ExclusionReason::MissingGender)]);
    }

    #[test]
    fn test_incomplete_identity_retained_when_allowed() {
        let mut nameless = raw_patient(1, "Anna", "Berg", "1960-01-01");
        nameless.first_name = None;

        let mut config = PipelineConfig::default();
        config.completeness.exclude_incomplete_identity = false;
        let output = run_with(config, patients_only(vec![nameless]));

        assert!(output.gold.exclusions.is_empty());
        assert_eq!(output.gold.features.len(), 1);
        assert_eq!(output.gold.features[0].age, 64);
        assert!(output.identity.clusters()[0].incomplete_identity);
    }

    #[test]
    fn test_labs_outside_stay_used_when_not_restricted() {
        let labs = vec![
            raw_lab(1, 1, "Glucose", 100.0, "2024-03-02"),
            raw_lab(2, 1, "Hemoglobin", 13.0, "2024-04-01"),
            raw_lab(3, 1, "Hemoglobin", 12.0, "2023-12-24"),
        ];
        let sources = utils::sources_from(
            vec![raw_patient(1, "Anna", "Berg", "1960-01-01")],
            Vec::new(),
            labs.clone(),
            Vec::new(),
        );
        let restricted = run(sources);
        let anna = feature_for(&restricted, 1);
        assert_eq!(anna.num_lab_tests, 1);
        assert_eq!(anna.avg_hemoglobin, None);

        let mut config = PipelineConfig::default();
        config.features.restrict_labs_to_stay = false;
        let sources = utils::sources_from(
            vec![raw_patient(1, "Anna", "Berg", "1960-01-01")],
            Vec::new(),
            labs,
            Vec::new(),
        );
        let unrestricted = run_with(config, sources);
        let anna = feature_for(&unrestricted, 1);
        assert_eq!(anna.num_lab_tests, 3);
        assert_eq!(anna.avg_hemoglobin, Some(12.5));
        assert_eq!(anna.avg_glucose, Some(100.0));
    }

    #[test]
    fn test_invalid_values_are_left_out_of_means() {
        let labs = vec![
            raw_lab(1, 1, "Creatinine", -1.0, "2024-03-02"),
            raw_lab(2, 1, "Creatinine", 1.2, "2024-03-03"),
            raw_lab(3, 2, "CREA", -0.5, "2024-03-02"),
        ];
        let sources = utils::sources_from(
            vec![
                raw_patient(1, "Anna", "Berg", "1960-01-01"),
                raw_patient(2, "Bo", "Dahl", "1961-01-01"),
            ],
            Vec::new(),
            labs,
            Vec::new(),
        );
        let output = run(sources);

        let anna = feature_for(&output, 1);
        assert_eq!(anna.num_lab_tests, 2);
        assert_eq!(anna.avg_creatinine, Some(1.2));

        let bo = feature_for(&output, 2);
        assert_eq!(bo.num_lab_tests, 1);
        assert_eq!(bo.avg_creatinine, None);
        assert_eq!(output.quality.metric("labs_invalid_values"), Some(2.0));
    }
}
