#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use readmission_pipeline::lookup::LookupTables;
    use readmission_pipeline::models::{FieldStatus, Gender, LabTest, RawPatient};
    use readmission_pipeline::standardize::{FieldKind, StandardValue, StandardizationEngine};

    #[test]
    fn test_diagnosis_codes_collapse_case_and_whitespace() {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);

        for raw in ["E11", "e11", " E11 "] {
            let field = engine.standardize(Some(raw), FieldKind::DiagnosisCode);
            assert_eq!(field.value, Some(StandardValue::Code("E11".to_string())));
            assert_eq!(field.status, FieldStatus::Valid);
            assert_eq!(field.raw.as_deref(), Some(raw));
        }

        let detailed = engine.standardize(Some("E11.9"), FieldKind::DiagnosisCode);
        assert_eq!(detailed.value, Some(StandardValue::Code("E11.9".to_string())));
        assert!(!detailed.was_changed);

        let dashed = engine.standardize(Some("I-10"), FieldKind::DiagnosisCode);
        assert_eq!(dashed.value, Some(StandardValue::Code("I10".to_string())));
        assert!(dashed.was_changed);
    }

    #[test]
    fn test_free_text_code_is_unrecognized() {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);

        let field = engine.standardize(Some("Diabetes Type 2"), FieldKind::DiagnosisCode);
        assert_eq!(field.status, FieldStatus::Unrecognized);

        let empty = engine.standardize(Some("--"), FieldKind::DiagnosisCode);
        assert_eq!(empty.status, FieldStatus::Missing);
        assert_eq!(empty.value, None);
    }

    #[test]
    fn test_metformin_variants_resolve_to_canonical_name() {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);

        for raw in ["Metformin", "metformin", "Metformine", "METFORMIN"] {
            let field = engine.standardize(Some(raw), FieldKind::MedicationName);
            assert_eq!(
                field.value,
                Some(StandardValue::Medication("Metformin".to_string())),
                "variant {raw}"
            );
            assert_eq!(field.was_changed, raw != "Metformin");
        }
    }

    #[test]
    fn test_unknown_medication_passes_through() {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);

        let field = engine.standardize(Some("Vitamin D"), FieldKind::MedicationName);
        assert_eq!(field.status, FieldStatus::Unrecognized);
        assert!(!field.was_changed);
        assert_eq!(field.value, Some(StandardValue::Medication("Vitamin D".to_string())));
    }

    #[test]
    fn test_dates_accept_every_configured_format() {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);
        let expected = StandardValue::Date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());

        for raw in ["03/07/2024", "2024-03-07", "2024/03/07", "20240307"] {
            let field = engine.standardize(Some(raw), FieldKind::Date);
            assert_eq!(field.value.as_ref(), Some(&expected), "format {raw}");
        }

        let failed = engine.standardize(Some("7th of March"), FieldKind::Date);
        assert_eq!(failed.status, FieldStatus::Invalid);
        assert_eq!(failed.value, None);
        assert_eq!(failed.raw.as_deref(), Some("7th of March"));
    }

    #[test]
    fn test_standardization_is_idempotent() {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);
        let cases = [
            (FieldKind::DiagnosisCode, vec!["e11.9", " I-10", "Diabetes Type 2", "J44"]),
            (FieldKind::MedicationName, vec!["metformine", "ASA", "Vitamin D", " lisinoprel "]),
            (FieldKind::Date, vec!["01/31/2023", "2023-01-31", "20230131"]),
        ];

        for (kind, raws) in cases {
            for raw in raws {
                let once = engine.standardize(Some(raw), kind);
                let rendered = once.value.as_ref().map(ToString::to_string);
                let twice = engine.standardize(rendered.as_deref(), kind);
                assert_eq!(once.value, twice.value, "{kind:?} {raw}");
                assert!(!twice.was_changed, "{kind:?} {raw}");
            }
        }
    }

    #[test]
    fn test_patient_row_standardization() {
        let lookups = LookupTables::default();
        let engine = StandardizationEngine::new(&lookups);
        let raw = RawPatient {
            patient_id: 12,
            first_name: Some("  Maria ".to_string()),
            last_name: Some("Lopez".to_string()),
            date_of_birth: Some("05/14/1961".to_string()),
            age: Some(62),
            gender: Some("female".to_string()),
            admission_date: Some("2024-02-01".to_string()),
            discharge_date: Some("2024-01-30".to_string()),
            length_of_stay: Some(3),
            readmitted_30_days: Some(1),
        };

        let patient = engine.patient(&raw);
        assert_eq!(patient.first_name.as_deref(), Some("Maria"));
        assert_eq!(patient.gender, Gender::Female);
        assert!(patient.date_of_birth.was_changed);
        assert_eq!(patient.length_of_stay(), Some(-2));
        assert_eq!(patient.reported_length_of_stay, Some(3));
        assert_eq!(patient.reported_age, Some(62));
    }

    #[test]
    fn test_lab_test_aliases() {
        assert_eq!(LabTest::from_name(" hgb "), LabTest::Hemoglobin);
        assert_eq!(LabTest::from_name("White Blood Cell Count"), LabTest::Wbc);
        assert_eq!(
            LabTest::from_name("Ferritin"),
            LabTest::Other("Ferritin".to_string())
        );
    }
}
