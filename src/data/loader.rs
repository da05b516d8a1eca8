use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type,
    Int64Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, ResultTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a result table from a file.  Dispatch by file name.
///
/// Supported formats:
/// * `.parquet`, `.pq`, `.parquet.gzip`, `.parquet.gz` – flat Parquet table
///   (pandas writes gzip-compressed pages under the `.parquet.gzip` name)
/// * `.csv`  – header row, one row per option
/// * `.json` – `[{ "date": "...", "K/F": 0.95, ... }, ...]`
pub fn load_file(path: &Path) -> Result<ResultTable> {
    let original = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let file_name = original.to_ascii_lowercase();
    let name = table_name(original);

    let is_parquet = [".parquet", ".pq", ".parquet.gzip", ".parquet.gz"]
        .iter()
        .any(|ext| file_name.ends_with(ext));

    if is_parquet {
        load_parquet(path, name)
    } else if file_name.ends_with(".csv") {
        load_csv(path, name)
    } else if file_name.ends_with(".json") {
        load_json(path, name)
    } else {
        bail!("Unsupported file type: {file_name}")
    }
}

/// File name up to the first `.`, e.g. `results_birs_noLCS`.
fn table_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Columns appear in first-seen order; a key missing from a record is null.
fn load_json(path: &Path, name: &str) -> Result<ResultTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .iter()
        .map(|col| {
            let values = records
                .iter()
                .map(|rec| rec.get(col).map_or(CellValue::Null, json_to_cell))
                .collect();
            Column::new(col, values)
        })
        .collect();

    ResultTable::new(name, columns)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => guess_cell_type(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one option per row.
fn load_csv(path: &Path, name: &str) -> Result<ResultTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, column) in values.iter_mut().enumerate() {
            column.push(guess_cell_type(record.get(col_idx).unwrap_or("")));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(h, v)| Column::new(h, v))
        .collect();
    ResultTable::new(name, columns)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    if let Some(date) = iso_date(s) {
        return CellValue::Date(date.to_string());
    }
    CellValue::String(s.to_string())
}

/// `YYYY-MM-DD`, optionally followed by a midnight time as pandas writes it.
fn iso_date(s: &str) -> Option<&str> {
    let date = match s.len() {
        10 => s,
        19 if s.ends_with(" 00:00:00") || s.ends_with("T00:00:00") => &s[..10],
        _ => return None,
    };
    let ok = date.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    });
    ok.then_some(date)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file holding one method's results.
///
/// Numeric, string, boolean and date/timestamp columns are read natively;
/// anything else is kept as its display text. Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, name: &str) -> Result<ResultTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in values.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            column.reserve(batch.num_rows());
            for row in 0..batch.num_rows() {
                let cell = extract_cell(array, row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", names[col_idx]))?;
                column.push(cell);
            }
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(n, v)| Column::new(n, v))
        .collect();
    ResultTable::new(name, columns)
}

// -- Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            CellValue::Integer(i64::try_from(v).context("UInt64 value exceeds i64")?)
        }
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Date32 => date_cell(col.as_primitive::<Date32Type>().value_as_date(row))?,
        DataType::Date64 => date_cell(col.as_primitive::<Date64Type>().value_as_date(row))?,
        // pandas datetime64 columns; trading dates carry no time of day
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
                TimeUnit::Millisecond => {
                    col.as_primitive::<TimestampMillisecondType>().value_as_datetime(row)
                }
                TimeUnit::Microsecond => {
                    col.as_primitive::<TimestampMicrosecondType>().value_as_datetime(row)
                }
                TimeUnit::Nanosecond => {
                    col.as_primitive::<TimestampNanosecondType>().value_as_datetime(row)
                }
            };
            date_cell(datetime.map(|dt| dt.date()))?
        }
        _ => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
                .context("formatting column value")?;
            CellValue::String(formatter.value(row).to_string())
        }
    };
    Ok(cell)
}

fn date_cell(date: Option<impl ToString>) -> Result<CellValue> {
    date.map(|d| CellValue::Date(d.to_string()))
        .context("date out of range")
}
