//! Parquet file operations
//!
//! Source extracts are read into Arrow record batches and decoded into raw
//! rows with `serde_arrow`. Output tables go the other way through
//! `ArrowWriter`.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::{PipelineError, Result, SourceKind};
use crate::models::{SourceTable, SourceTables};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Validates that a directory exists and is a directory
///
/// # Errors
/// Returns an error if the directory does not exist or is not a directory
pub fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory does not exist: {}", dir.display()),
        )));
    }
    Ok(())
}

/// Location of a source extract inside an input directory
#[must_use]
pub fn source_path(dir: &Path, kind: SourceKind) -> PathBuf {
    dir.join(format!("{}.parquet", kind.table_name()))
}

/// Read a parquet file into Arrow record batches
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = std::time::Instant::now();
    log_operation_start("Reading parquet file", path);

    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

    log_operation_complete(
        "read",
        path,
        batches.iter().map(RecordBatch::num_rows).sum(),
        Some(start.elapsed()),
    );
    Ok(batches)
}

/// Read a parquet file and decode every row into `T`
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    for batch in read_parquet(path)? {
        let decoded: Vec<T> = serde_arrow::from_record_batch(&batch)?;
        rows.extend(decoded);
    }
    Ok(rows)
}

fn load_source<T: DeserializeOwned>(dir: &Path, kind: SourceKind) -> Result<Option<SourceTable<T>>> {
    let path = source_path(dir, kind);
    if !path.is_file() {
        log_warning(&format!("Source '{kind}' not found"), Some(&path));
        return Ok(None);
    }
    let rows = read_records(&path)?;
    let source_file = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(Some(SourceTable::new(source_file, rows)))
}

/// Load the four source extracts of a directory in parallel
///
/// An absent file becomes a missing source; the pipeline decides whether that
/// is fatal.
///
/// # Errors
/// Returns an error if the directory does not exist or a present file cannot be decoded
pub fn load_sources(dir: &Path) -> Result<SourceTables> {
    validate_directory(dir)?;

    let ((patients, diagnoses), (lab_results, medications)) = rayon::join(
        || {
            rayon::join(
                || load_source(dir, SourceKind::Patients),
                || load_source(dir, SourceKind::Diagnoses),
            )
        },
        || {
            rayon::join(
                || load_source(dir, SourceKind::LabResults),
                || load_source(dir, SourceKind::Medications),
            )
        },
    );

    Ok(SourceTables {
        patients: patients?,
        diagnoses: diagnoses?,
        lab_results: lab_results?,
        medications: medications?,
    })
}

/// Output rows that can supply a representative sample for schema tracing
///
/// The sample is traced together with the rows, so optional columns that are
/// null in every row and empty tables still get their real Arrow types.
pub trait SchemaSample: Serialize + Sized {
    /// A row with every optional field populated
    fn schema_sample() -> Self;
}

/// Write rows to a parquet file, tracing the Arrow schema from the rows
pub fn write_records<T: SchemaSample>(path: &Path, rows: &[T]) -> Result<()> {
    let start = std::time::Instant::now();
    log_operation_start("Writing parquet file", path);

    let sample = T::schema_sample();
    let traced: Vec<&T> = rows.iter().chain(std::iter::once(&sample)).collect();
    let fields = Vec::<FieldRef>::from_samples(
        &traced,
        TracingOptions::default().allow_null_fields(true),
    )?;
    let batch = serde_arrow::to_record_batch(&fields, &rows)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;

    log_operation_complete("wrote", path, rows.len(), Some(start.elapsed()));
    Ok(())
}
