//! Decoding of downloaded Parquet files into [NewsRecord]s.
//!
//! Every record batch is turned into JSON objects column by column, then each object is
//! deserialized into a [NewsRecord]. Columns the record does not name land in its `extra` map.

use arrow_array::{
    Array, RecordBatch,
    cast::AsArray,
    types::{
        Date32Type, Date64Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type,
        Int64Type, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
        TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
    },
};
use arrow_schema::{DataType, TimeUnit};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value};

use super::DatasetError;
use crate::news::NewsRecord;

/// Column that must be present in every source.
pub const EMBEDDING_COLUMN: &str = "embedding";

/// Dataset side identifier, replaced by the one the store assigns.
pub const SOURCE_ID_COLUMN: &str = "_id";

/// Decode a whole Parquet file.
pub fn decode(body: Bytes) -> Result<Vec<NewsRecord>, DatasetError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(body)?;

    if builder.schema().column_with_name(EMBEDDING_COLUMN).is_none() {
        return Err(DatasetError::MissingColumn(EMBEDDING_COLUMN.to_string()));
    }

    let mut records = Vec::new();
    for batch in builder.build()? {
        for mut row in batch_rows(&batch?)? {
            row.remove(SOURCE_ID_COLUMN);
            records.push(serde_json::from_value(Value::Object(row))?);
        }
    }

    Ok(records)
}

/// Convert a record batch into one JSON object per row, keyed by column name.
pub fn batch_rows(batch: &RecordBatch) -> Result<Vec<Map<String, Value>>, DatasetError> {
    let schema = batch.schema();

    (0..batch.num_rows())
        .map(|row| {
            schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, column)| Ok((field.name().clone(), value_at(column.as_ref(), row)?)))
                .collect::<Result<Map<_, _>, DatasetError>>()
        })
        .collect()
}

macro_rules! primitive {
    ($array:expr, $ty:ty, $row:expr) => {
        $array
            .as_primitive_opt::<$ty>()
            .map(|array| Value::from(array.value($row)))
    };
}

macro_rules! timestamp {
    ($array:expr, $ty:ty, $row:expr) => {
        $array.as_primitive_opt::<$ty>().map(|array| {
            array
                .value_as_datetime($row)
                .map_or(Value::Null, |datetime| {
                    Value::String(datetime.and_utc().to_rfc3339())
                })
        })
    };
}

macro_rules! date {
    ($array:expr, $ty:ty, $row:expr) => {
        $array.as_primitive_opt::<$ty>().map(|array| {
            array
                .value_as_date($row)
                .map_or(Value::Null, |date| Value::String(date.to_string()))
        })
    };
}

/// JSON value of one cell. Temporal values become ISO 8601 strings and NaN floats become null.
fn value_at(array: &dyn Array, row: usize) -> Result<Value, DatasetError> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        DataType::Null => Some(Value::Null),
        DataType::Boolean => array
            .as_boolean_opt()
            .map(|array| Value::Bool(array.value(row))),
        DataType::Int8 => primitive!(array, Int8Type, row),
        DataType::Int16 => primitive!(array, Int16Type, row),
        DataType::Int32 => primitive!(array, Int32Type, row),
        DataType::Int64 => primitive!(array, Int64Type, row),
        DataType::UInt8 => primitive!(array, UInt8Type, row),
        DataType::UInt16 => primitive!(array, UInt16Type, row),
        DataType::UInt32 => primitive!(array, UInt32Type, row),
        DataType::UInt64 => primitive!(array, UInt64Type, row),
        DataType::Float32 => primitive!(array, Float32Type, row),
        DataType::Float64 => primitive!(array, Float64Type, row),
        DataType::Utf8 => array
            .as_string_opt::<i32>()
            .map(|array| Value::from(array.value(row))),
        DataType::LargeUtf8 => array
            .as_string_opt::<i64>()
            .map(|array| Value::from(array.value(row))),
        DataType::Utf8View => array
            .as_string_view_opt()
            .map(|array| Value::from(array.value(row))),
        DataType::Date32 => date!(array, Date32Type, row),
        DataType::Date64 => date!(array, Date64Type, row),
        DataType::Timestamp(TimeUnit::Second, _) => timestamp!(array, TimestampSecondType, row),
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            timestamp!(array, TimestampMillisecondType, row)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            timestamp!(array, TimestampMicrosecondType, row)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            timestamp!(array, TimestampNanosecondType, row)
        }
        DataType::List(_) => match array.as_list_opt::<i32>() {
            Some(list) => Some(list_value(list.value(row).as_ref())?),
            None => None,
        },
        DataType::LargeList(_) => match array.as_list_opt::<i64>() {
            Some(list) => Some(list_value(list.value(row).as_ref())?),
            None => None,
        },
        DataType::FixedSizeList(..) => match array.as_fixed_size_list_opt() {
            Some(list) => Some(list_value(list.value(row).as_ref())?),
            None => None,
        },
        DataType::Struct(_) => match array.as_struct_opt() {
            Some(fields) => Some(Value::Object(
                fields
                    .column_names()
                    .into_iter()
                    .zip(fields.columns())
                    .map(|(name, column)| Ok((name.to_string(), value_at(column.as_ref(), row)?)))
                    .collect::<Result<Map<_, _>, DatasetError>>()?,
            )),
            None => None,
        },
        _ => None,
    };

    value.ok_or_else(|| DatasetError::UnsupportedType(array.data_type().to_string()))
}

fn list_value(values: &dyn Array) -> Result<Value, DatasetError> {
    (0..values.len())
        .map(|idx| value_at(values, idx))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

#[cfg(test)]
pub(crate) fn to_parquet_bytes(batch: &RecordBatch) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut writer =
        parquet::arrow::ArrowWriter::try_new(&mut buf, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
    buf
}

#[cfg(test)]
pub(crate) fn news_batch(companies: &[&str]) -> RecordBatch {
    use std::sync::Arc;

    use arrow_array::{ArrayRef, ListArray, StringArray};

    let ids: Vec<String> = (0..companies.len()).map(|i| format!("id-{i}")).collect();
    let titles: Vec<String> = companies.iter().map(|c| format!("{c} news")).collect();
    let embeddings = (0..companies.len()).map(|i| Some(vec![Some(i as f64), Some(1.0)]));

    RecordBatch::try_from_iter(vec![
        (
            "_id",
            Arc::new(StringArray::from_iter_values(ids)) as ArrayRef,
        ),
        (
            "companyName",
            Arc::new(StringArray::from_iter_values(companies.iter().copied())) as ArrayRef,
        ),
        (
            "title",
            Arc::new(StringArray::from_iter_values(titles)) as ArrayRef,
        ),
        (
            "embedding",
            Arc::new(ListArray::from_iter_primitive::<Float64Type, _, _>(embeddings)) as ArrayRef,
        ),
    ])
    .unwrap()
}
