// src/storage/codec.rs

//! Parquet encoding of canonical job records.
//!
//! The column layout is the output contract; readers downstream depend on
//! names, order and nullability staying fixed.

use std::sync::Arc;

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::{
    Array, ArrayRef, BooleanArray, Int64Array, ListArray, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{AppError, Result};
use crate::models::{NormalizedJobRecord, WorkplaceType};

fn string_list() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

/// Fixed schema of a partition file.
pub fn job_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("job_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("company", DataType::Utf8, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("employment_type", DataType::Utf8, true),
        Field::new("seniority_level", DataType::Utf8, true),
        Field::new("industries", string_list(), false),
        Field::new("job_functions", string_list(), false),
        Field::new("workplace_type", DataType::Utf8, true),
        Field::new("description", DataType::Utf8, true),
        Field::new("skills", string_list(), false),
        Field::new("job_url", DataType::Utf8, false),
        Field::new("reposted", DataType::Boolean, true),
        Field::new("posted_time", DataType::Int64, true),
        Field::new("expire_time", DataType::Int64, true),
        Field::new("apply_url", DataType::Utf8, true),
    ]))
}

fn optional_strings<'a>(
    records: &[&'a NormalizedJobRecord],
    get: impl Fn(&'a NormalizedJobRecord) -> Option<&'a str>,
) -> ArrayRef {
    Arc::new(StringArray::from(
        records.iter().map(|r| get(*r)).collect::<Vec<_>>(),
    ))
}

fn required_strings<'a>(
    records: &[&'a NormalizedJobRecord],
    get: impl Fn(&'a NormalizedJobRecord) -> &'a str,
) -> ArrayRef {
    Arc::new(StringArray::from(
        records.iter().map(|r| get(*r)).collect::<Vec<_>>(),
    ))
}

fn string_lists<'a>(
    records: &[&'a NormalizedJobRecord],
    get: impl Fn(&'a NormalizedJobRecord) -> &'a [String],
) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for record in records {
        for value in get(*record) {
            builder.values().append_value(value);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

/// Build the record batch for a set of already validated records.
pub fn to_record_batch(records: &[&NormalizedJobRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        required_strings(records, |r| r.job_id.as_str()),
        optional_strings(records, |r| r.title.as_deref()),
        optional_strings(records, |r| r.company.as_deref()),
        optional_strings(records, |r| r.location.as_deref()),
        optional_strings(records, |r| r.employment_type.as_deref()),
        optional_strings(records, |r| r.seniority_level.as_deref()),
        string_lists(records, |r| r.industries.as_slice()),
        string_lists(records, |r| r.job_functions.as_slice()),
        optional_strings(records, |r| Some(r.workplace_type.as_str())),
        optional_strings(records, |r| r.description.as_deref()),
        string_lists(records, |r| r.skills.as_slice()),
        required_strings(records, |r| r.job_url.as_str()),
        Arc::new(BooleanArray::from(
            records.iter().map(|r| r.reposted).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            records.iter().map(|r| r.posted_time).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            records.iter().map(|r| r.expire_time).collect::<Vec<_>>(),
        )),
        optional_strings(records, |r| r.apply_url.as_deref()),
    ];

    Ok(RecordBatch::try_new(job_schema(), columns)?)
}

/// Serialize records into one snappy-compressed parquet blob.
pub fn encode_records(records: &[&NormalizedJobRecord]) -> Result<Vec<u8>> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(Vec::new(), job_schema(), Some(props))?;

    if !records.is_empty() {
        let batch = to_record_batch(records)?;
        writer.write(&batch)?;
    }

    Ok(writer.into_inner()?)
}

/// Read a parquet blob written by [`encode_records`] back into records.
pub fn decode_records(bytes: Vec<u8>) -> Result<Vec<NormalizedJobRecord>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        records.extend(records_from_batch(&batch)?);
    }
    Ok(records)
}

fn records_from_batch(batch: &RecordBatch) -> Result<Vec<NormalizedJobRecord>> {
    let job_id = column::<StringArray>(batch, "job_id")?;
    let title = column::<StringArray>(batch, "title")?;
    let company = column::<StringArray>(batch, "company")?;
    let location = column::<StringArray>(batch, "location")?;
    let employment_type = column::<StringArray>(batch, "employment_type")?;
    let seniority_level = column::<StringArray>(batch, "seniority_level")?;
    let industries = column::<ListArray>(batch, "industries")?;
    let job_functions = column::<ListArray>(batch, "job_functions")?;
    let workplace_type = column::<StringArray>(batch, "workplace_type")?;
    let description = column::<StringArray>(batch, "description")?;
    let skills = column::<ListArray>(batch, "skills")?;
    let job_url = column::<StringArray>(batch, "job_url")?;
    let reposted = column::<BooleanArray>(batch, "reposted")?;
    let posted_time = column::<Int64Array>(batch, "posted_time")?;
    let expire_time = column::<Int64Array>(batch, "expire_time")?;
    let apply_url = column::<StringArray>(batch, "apply_url")?;

    (0..batch.num_rows())
        .map(|row| {
            Ok(NormalizedJobRecord {
                job_id: job_id.value(row).to_string(),
                title: opt_string(title, row),
                company: opt_string(company, row),
                location: opt_string(location, row),
                employment_type: opt_string(employment_type, row),
                seniority_level: opt_string(seniority_level, row),
                industries: list_strings(industries, row)?,
                job_functions: list_strings(job_functions, row)?,
                workplace_type: opt_string(workplace_type, row)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(WorkplaceType::Unknown),
                description: opt_string(description, row),
                skills: list_strings(skills, row)?,
                job_url: job_url.value(row).to_string(),
                reposted: (!reposted.is_null(row)).then(|| reposted.value(row)),
                posted_time: (!posted_time.is_null(row)).then(|| posted_time.value(row)),
                expire_time: (!expire_time.is_null(row)).then(|| expire_time.value(row)),
                apply_url: opt_string(apply_url, row),
            })
        })
        .collect()
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| AppError::validation(format!("Column '{}' missing or mistyped", name)))
}

fn opt_string(array: &StringArray, row: usize) -> Option<String> {
    (!array.is_null(row)).then(|| array.value(row).to_string())
}

fn list_strings(array: &ListArray, row: usize) -> Result<Vec<String>> {
    if array.is_null(row) {
        return Ok(Vec::new());
    }
    let values = array.value(row);
    let strings = values
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AppError::validation("List column does not hold strings"))?;
    Ok(strings.iter().flatten().map(str::to_string).collect())
}
