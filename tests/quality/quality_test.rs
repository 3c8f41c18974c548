#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use readmission_pipeline::quality::{MetricDefinition, MetricError, QualityInputs, QualityReporter};
    use readmission_pipeline::{Pipeline, PipelineConfig};

    use crate::utils::{self, raw_lab, raw_patient};

    #[test]
    fn test_empty_run_captures_rate_failures() {
        let sources = utils::sources_from(Vec::new(), Vec::new(), Vec::new(), Vec::new());
        let output = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(sources)
            .unwrap();
        let report = &output.quality;

        for name in [
            "patients_duplicate_rate",
            "patients_readmission_rate",
            "labs_outlier_rate",
        ] {
            assert!(report.failure(name).is_some(), "{name} should fail");
            assert_eq!(report.metric(name), None);
        }
        assert_eq!(report.metric("patients_total"), Some(0.0));
        assert_eq!(report.metric("labs_total"), Some(0.0));
        assert_eq!(report.metric("issues_parse_failure"), Some(0.0));
    }

    #[test]
    fn test_failing_metric_does_not_block_others() {
        let sources = utils::sources_from(
            vec![raw_patient(1, "Anna", "Berg", "1960-01-01")],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let output = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(sources)
            .unwrap();

        let reporter = QualityReporter::new(vec![
            MetricDefinition::new("always_fails", |_| {
                Err(MetricError::EmptyDenominator("nothing"))
            }),
            MetricDefinition::new("retained", |i| Ok(i.gold.features.len() as f64)),
        ]);
        let inputs = QualityInputs {
            silver: &output.silver,
            identity: &output.identity,
            lab_groups: &output.lab_groups,
            gold: &output.gold,
            orphans: output.orphans,
        };
        let report = reporter.report(&inputs, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        assert_eq!(report.metric("retained"), Some(1.0));
        assert_eq!(
            report.failure("always_fails").map(|f| f.reason.as_str()),
            Some("denominator 'nothing' is zero")
        );
    }

    #[test]
    fn test_issue_and_exclusion_counts() {
        let mut bad_dates = raw_patient(2, "Bo", "Dahl", "1961-01-01");
        bad_dates.admission_date = Some("March 1st".to_string());
        let mut lab = raw_lab(1, 1, "Glucose", 100.0, "2024-03-02");
        lab.test_date = Some("yesterday".to_string());
        let sources = utils::sources_from(
            vec![raw_patient(1, "Anna", "Berg", "1960-01-01"), bad_dates],
            vec![utils::raw_diagnosis(1, 1, "Diabetes Type 2")],
            vec![lab],
            vec![utils::raw_medication(1, 1, "Vitamin D")],
        );
        let output = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(sources)
            .unwrap();
        let report = &output.quality;

        assert_eq!(report.metric("dates_parse_failures"), Some(2.0));
        assert_eq!(report.metric("issues_parse_failure"), Some(2.0));
        assert_eq!(report.metric("issues_standardization_miss"), Some(2.0));
        assert_eq!(report.metric("issues_insufficient_sample"), Some(1.0));
        assert_eq!(report.metric("issues_completeness_gate_failure"), Some(1.0));
        assert_eq!(report.metric("excluded_missing_admission_date"), Some(1.0));
        assert_eq!(report.metric("excluded_invalid_age"), None);
        assert_eq!(report.metric("diagnoses_invalid_codes"), Some(1.0));
        assert_eq!(report.metric("medications_unrecognized"), Some(1.0));
        assert_eq!(report.exclusions.len(), 1);
    }

    #[test]
    fn test_incomplete_rows_are_counted_per_row() {
        let mut absorbed = raw_patient(4, "Anna", "Berg", "1970-02-02");
        absorbed.first_name = None;
        let mut alone = raw_patient(5, "Bo", "Dahl", "1961-01-01");
        alone.date_of_birth = Some("not a date".to_string());
        let sources = utils::sources_from(
            vec![raw_patient(4, "Anna", "Berg", "1970-02-02"), absorbed, alone],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let output = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(sources)
            .unwrap();
        let report = &output.quality;

        assert_eq!(report.metric("patients_unique"), Some(2.0));
        assert_eq!(report.metric("patients_incomplete_identity"), Some(2.0));
        assert_eq!(report.metric("issues_incomplete_identity"), Some(2.0));
        assert_eq!(report.metric("excluded_incomplete_identity"), Some(1.0));
        assert_eq!(report.metric("patients_retained"), Some(1.0));
    }
}
