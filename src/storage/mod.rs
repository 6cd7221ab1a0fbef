//! Table storage (Arrow/Parquet)
//!
//! Each table is one Parquet file in the store's data directory:
//!
//! ```text
//! estimators.parquet   id, created, modified, model_type, model_class,
//!                      model_form, estimator, build_time, owner_id, corpus_id
//! evaluations.parquet  id, created, modified, metric, score, label, folds,
//!                      estimator_id
//! ```
//!
//! Tables are small and written whole: a save rewrites every file through a
//! temporary file and a rename, so a crash never leaves a half-written table.

use arrow::array::{
    Array, ArrayRef, BinaryArray, DurationMicrosecondArray, Float64Array, Int64Array, ListArray,
    RecordBatch, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef, TimeUnit};
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::model::{CorpusId, Estimator, EstimatorId, Metric, ModelType, Score, ScoreId, UserId};
use crate::{Error, Result};

/// File name of the estimators table.
pub const ESTIMATORS_FILE: &str = "estimators.parquet";

/// File name of the evaluations (scores) table.
pub const EVALUATIONS_FILE: &str = "evaluations.parquet";

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

/// Arrow schema of the `estimators` table.
#[must_use]
pub fn estimators_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("created", timestamp_type(), false),
        Field::new("modified", timestamp_type(), false),
        Field::new("model_type", DataType::Utf8, false),
        Field::new("model_class", DataType::Utf8, true),
        Field::new("model_form", DataType::Utf8, true),
        Field::new("estimator", DataType::Binary, true),
        Field::new("build_time", DataType::Duration(TimeUnit::Microsecond), true),
        Field::new("owner_id", DataType::Int64, true),
        Field::new("corpus_id", DataType::Int64, true),
    ]))
}

/// Arrow schema of the `evaluations` table.
#[must_use]
pub fn evaluations_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("created", timestamp_type(), false),
        Field::new("modified", timestamp_type(), false),
        Field::new("metric", DataType::Utf8, false),
        Field::new("score", DataType::Float64, true),
        Field::new("label", DataType::Utf8, true),
        Field::new(
            "folds",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            true,
        ),
        Field::new("estimator_id", DataType::Int64, false),
    ]))
}

/// Convert estimator rows into a record batch.
///
/// # Errors
///
/// Returns error if a build time does not fit the microsecond column.
pub fn estimators_to_batch(rows: &[&Estimator]) -> Result<RecordBatch> {
    let build_times = rows
        .iter()
        .map(|e| e.build_time().map(duration_to_micros).transpose())
        .collect::<Result<Vec<_>>>()?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(
            rows.iter().map(|e| e.id().get()).collect::<Vec<_>>(),
        )),
        Arc::new(timestamps(rows.iter().map(|e| e.created()))),
        Arc::new(timestamps(rows.iter().map(|e| e.modified()))),
        Arc::new(StringArray::from(
            rows.iter()
                .map(|e| e.model_type().as_str())
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|e| e.model_class()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|e| e.model_form()).collect::<Vec<_>>(),
        )),
        Arc::new(BinaryArray::from(
            rows.iter().map(|e| e.estimator()).collect::<Vec<_>>(),
        )),
        Arc::new(DurationMicrosecondArray::from(build_times)),
        Arc::new(Int64Array::from(
            rows.iter()
                .map(|e| e.owner().map(UserId::get))
                .collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            rows.iter()
                .map(|e| e.corpus().map(CorpusId::get))
                .collect::<Vec<_>>(),
        )),
    ];

    Ok(RecordBatch::try_new(estimators_schema(), columns)?)
}

/// Convert score rows into a record batch.
///
/// # Errors
///
/// Returns error if the arrays do not match the table schema.
pub fn scores_to_batch(rows: &[&Score]) -> Result<RecordBatch> {
    let folds = ListArray::from_iter_primitive::<Float64Type, _, _>(
        rows.iter()
            .map(|s| s.folds().map(|f| f.iter().copied().map(Some).collect::<Vec<_>>())),
    );

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(
            rows.iter().map(|s| s.id().get()).collect::<Vec<_>>(),
        )),
        Arc::new(timestamps(rows.iter().map(|s| s.created()))),
        Arc::new(timestamps(rows.iter().map(|s| s.modified()))),
        Arc::new(StringArray::from(
            rows.iter().map(|s| s.metric().as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|s| s.score()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|s| s.label()).collect::<Vec<_>>(),
        )),
        Arc::new(folds),
        Arc::new(Int64Array::from(
            rows.iter().map(|s| s.estimator().get()).collect::<Vec<_>>(),
        )),
    ];

    Ok(RecordBatch::try_new(evaluations_schema(), columns)?)
}

/// Read estimator rows back out of a record batch.
///
/// # Errors
///
/// Returns [`Error::StorageError`] if a column is missing, has the wrong
/// type, or holds a value outside its domain (e.g. an unknown model type).
pub fn estimators_from_batch(batch: &RecordBatch) -> Result<Vec<Estimator>> {
    let id = typed::<Int64Array>(batch, "id")?;
    let created = typed::<TimestampMicrosecondArray>(batch, "created")?;
    let modified = typed::<TimestampMicrosecondArray>(batch, "modified")?;
    let model_type = typed::<StringArray>(batch, "model_type")?;
    let model_class = typed::<StringArray>(batch, "model_class")?;
    let model_form = typed::<StringArray>(batch, "model_form")?;
    let estimator = typed::<BinaryArray>(batch, "estimator")?;
    let build_time = typed::<DurationMicrosecondArray>(batch, "build_time")?;
    let owner = typed::<Int64Array>(batch, "owner_id")?;
    let corpus = typed::<Int64Array>(batch, "corpus_id")?;

    (0..batch.num_rows())
        .map(|i| -> Result<Estimator> {
            let model_type: ModelType = model_type
                .value(i)
                .parse()
                .map_err(|e| Error::StorageError(format!("estimators row {i}: {e}")))?;

            Ok(Estimator::from_row(
                EstimatorId::new(id.value(i)),
                micros_to_datetime(created.value(i))?,
                micros_to_datetime(modified.value(i))?,
                model_type,
                opt(model_class, i).map(|v| model_class.value(v).to_string()),
                opt(model_form, i).map(|v| model_form.value(v).to_string()),
                opt(estimator, i).map(|v| estimator.value(v).to_vec()),
                opt(build_time, i)
                    .map(|v| micros_to_duration(build_time.value(v)))
                    .transpose()?,
                opt(owner, i).map(|v| UserId::new(owner.value(v))),
                opt(corpus, i).map(|v| CorpusId::new(corpus.value(v))),
            ))
        })
        .collect()
}

/// Read score rows back out of a record batch.
///
/// # Errors
///
/// Returns [`Error::StorageError`] if a column is missing, has the wrong
/// type, or holds an unknown metric.
pub fn scores_from_batch(batch: &RecordBatch) -> Result<Vec<Score>> {
    let id = typed::<Int64Array>(batch, "id")?;
    let created = typed::<TimestampMicrosecondArray>(batch, "created")?;
    let modified = typed::<TimestampMicrosecondArray>(batch, "modified")?;
    let metric = typed::<StringArray>(batch, "metric")?;
    let score = typed::<Float64Array>(batch, "score")?;
    let label = typed::<StringArray>(batch, "label")?;
    let folds = typed::<ListArray>(batch, "folds")?;
    let estimator = typed::<Int64Array>(batch, "estimator_id")?;

    (0..batch.num_rows())
        .map(|i| -> Result<Score> {
            let metric: Metric = metric
                .value(i)
                .parse()
                .map_err(|e| Error::StorageError(format!("evaluations row {i}: {e}")))?;

            let fold_values: Option<Vec<f64>> = match opt(folds, i) {
                Some(v) => {
                    let values = folds.value(v);
                    let values = values
                        .as_any()
                        .downcast_ref::<Float64Array>()
                        .ok_or_else(|| {
                            Error::StorageError("folds must be a list of float64".to_string())
                        })?;
                    Some(values.iter().map(|f| f.unwrap_or(f64::NAN)).collect())
                }
                None => None,
            };

            Ok(Score::from_row(
                ScoreId::new(id.value(i)),
                micros_to_datetime(created.value(i))?,
                micros_to_datetime(modified.value(i))?,
                metric,
                opt(score, i).map(|v| score.value(v)),
                opt(label, i).map(|v| label.value(v).to_string()),
                fold_values,
                EstimatorId::new(estimator.value(i)),
            ))
        })
        .collect()
}

/// Write a record batch to a Parquet file, replacing any existing file.
///
/// # Errors
///
/// Returns error if the file cannot be written.
pub fn write_table(path: &Path, batch: &RecordBatch) -> Result<()> {
    let tmp = path.with_extension("parquet.tmp");

    let file = File::create(&tmp)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;

    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read every record batch of a Parquet file.
///
/// A missing file is an empty table.
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or parsed.
pub fn read_table(path: &Path) -> Result<Vec<RecordBatch>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

fn typed<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    batch
        .column_by_name(name)
        .and_then(|column| column.as_any().downcast_ref::<A>())
        .ok_or_else(|| {
            Error::StorageError(format!("column {name:?} is missing or has the wrong type"))
        })
}

/// Row index if the value is not null.
fn opt(array: &dyn Array, i: usize) -> Option<usize> {
    array.is_valid(i).then_some(i)
}

fn timestamps(values: impl Iterator<Item = DateTime<Utc>>) -> TimestampMicrosecondArray {
    TimestampMicrosecondArray::from(values.map(|t| t.timestamp_micros()).collect::<Vec<_>>())
        .with_timezone("UTC")
}

fn micros_to_datetime(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| Error::StorageError(format!("timestamp out of range: {micros}")))
}

fn duration_to_micros(duration: Duration) -> Result<i64> {
    i64::try_from(duration.as_micros())
        .map_err(|_| Error::StorageError(format!("build_time too large: {duration:?}")))
}

fn micros_to_duration(micros: i64) -> Result<Duration> {
    u64::try_from(micros)
        .map(Duration::from_micros)
        .map_err(|_| Error::StorageError(format!("negative build_time: {micros}us")))
}
