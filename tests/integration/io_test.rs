#[cfg(test)]
mod tests {
    use arrow::datatypes::DataType;
    use readmission_pipeline::error::SourceKind;
    use readmission_pipeline::models::{PatientDiagnosisCodes, PatientFeatureVector, RawPatient};
    use readmission_pipeline::utils::io::{load_sources, read_parquet, read_records, source_path};
    use readmission_pipeline::{Pipeline, PipelineConfig, QualityMetric, write_outputs};
    use tempfile::TempDir;

    use crate::utils::{self, write_parquet};

    #[test]
    fn test_raw_patients_survive_parquet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.parquet");
        let rows = utils::patients();

        write_parquet(&path, &rows).unwrap();
        let read: Vec<RawPatient> = read_records(&path).unwrap();

        assert_eq!(read, rows);
    }

    #[test]
    fn test_absent_files_become_missing_sources() {
        let dir = TempDir::new().unwrap();
        write_parquet(&source_path(dir.path(), SourceKind::Patients), &utils::patients()).unwrap();
        write_parquet(&source_path(dir.path(), SourceKind::Diagnoses), &utils::diagnoses()).unwrap();

        let sources = load_sources(dir.path()).unwrap();

        assert_eq!(sources.patients.as_ref().map(|t| t.rows.len()), Some(1000));
        assert_eq!(
            sources.patients.as_ref().map(|t| t.source_file.as_str()),
            Some("patients.parquet")
        );
        assert!(sources.diagnoses.is_some());
        assert!(sources.lab_results.is_none());
        assert!(sources.medications.is_none());
    }

    #[test]
    fn test_missing_input_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_sources(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_outputs_are_written() {
        let input = TempDir::new().unwrap();
        write_parquet(&source_path(input.path(), SourceKind::Patients), &utils::patients()).unwrap();
        write_parquet(&source_path(input.path(), SourceKind::Diagnoses), &utils::diagnoses()).unwrap();
        write_parquet(&source_path(input.path(), SourceKind::LabResults), &utils::lab_results())
            .unwrap();
        write_parquet(&source_path(input.path(), SourceKind::Medications), &utils::medications())
            .unwrap();

        let sources = load_sources(input.path()).unwrap();
        let output = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(sources)
            .unwrap();

        let out = TempDir::new().unwrap();
        let files = write_outputs(&out.path().join("gold"), &output.gold, &output.quality).unwrap();

        let metrics: Vec<QualityMetric> = read_records(&files.metrics).unwrap();
        assert_eq!(metrics, output.quality.metrics);

        let json = std::fs::read_to_string(&files.report).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            report["metrics"].as_array().map(Vec::len),
            Some(output.quality.metrics.len())
        );
        let batches = read_parquet(&files.features).unwrap();
        let schema = batches[0].schema();
        let columns: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(columns, PatientFeatureVector::COLUMNS);

        let features: Vec<PatientFeatureVector> = read_records(&files.features).unwrap();
        assert_eq!(features, output.gold.features);
        let codes: Vec<PatientDiagnosisCodes> = read_records(&files.diagnosis_codes).unwrap();
        assert_eq!(codes, output.gold.diagnosis_codes);
    }

    #[test]
    fn test_empty_run_writes_typed_outputs() {
        let sources = utils::sources_from(Vec::new(), Vec::new(), Vec::new(), Vec::new());
        let output = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(sources)
            .unwrap();
        assert!(output.gold.features.is_empty());

        let out = TempDir::new().unwrap();
        let files = write_outputs(out.path(), &output.gold, &output.quality).unwrap();

        let features: Vec<PatientFeatureVector> = read_records(&files.features).unwrap();
        assert!(features.is_empty());
        let codes: Vec<PatientDiagnosisCodes> = read_records(&files.diagnosis_codes).unwrap();
        assert!(codes.is_empty());
        let metrics: Vec<QualityMetric> = read_records(&files.metrics).unwrap();
        assert_eq!(metrics, output.quality.metrics);
        assert!(output.quality.failure("patients_duplicate_rate").is_some());
        assert!(files.report.is_file());
    }

    #[test]
    fn test_all_null_means_keep_float_columns() {
        let sources = utils::sources_from(
            vec![utils::raw_patient(1, "Anna", "Berg", "1960-01-01")],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let output = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(sources)
            .unwrap();
        assert_eq!(output.gold.features[0].avg_glucose, None);

        let out = TempDir::new().unwrap();
        let files = write_outputs(out.path(), &output.gold, &output.quality).unwrap();

        let batches = read_parquet(&files.features).unwrap();
        let schema = batches[0].schema();
        let glucose = schema.field_with_name("avg_glucose").unwrap();
        assert_eq!(glucose.data_type(), &DataType::Float64);
        let features: Vec<PatientFeatureVector> = read_records(&files.features).unwrap();
        assert_eq!(features, output.gold.features);
    }
}
