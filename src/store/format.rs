//! Columnar (de)serialization of the backing objects
//!
//! Two wire formats are supported; a deployment picks exactly one and the
//! choice is not interchangeable with the other. All reads and writes go
//! through in-memory buffers.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use polars::prelude::*;

use super::StoreError;
use crate::models::{columns, MetricsTable, TimeSeriesTable};

/// Serialization format of the published objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Columnar-table format (parquet)
    Parquet,
    /// Arrow IPC, the hierarchical-array deployment variant
    Ipc,
}

impl DataFormat {
    /// File extension used in object keys
    pub fn ext(&self) -> &'static str {
        match self {
            DataFormat::Parquet => "parquet",
            DataFormat::Ipc => "arrow",
        }
    }
}

impl FromStr for DataFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(DataFormat::Parquet),
            "ipc" | "arrow" | "feather" => Ok(DataFormat::Ipc),
            other => Err(StoreError::Format(other.to_string())),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

/// Deserialize a strategy table: decode the frame, normalize the `date`
/// column into a sorted, unique time index, and extract the numeric columns.
///
/// Returns data-quality warnings alongside the table (missing `date` column,
/// skipped non-numeric columns, dropped duplicate dates). A `date` column
/// that exists but cannot be parsed is a hard decode error.
pub fn read_table(
    bytes: &[u8],
    format: DataFormat,
) -> Result<(TimeSeriesTable, Vec<String>), StoreError> {
    let df = read_dataframe(bytes, format)?;
    dataframe_to_table(&df)
}

/// Deserialize a metrics table. Metrics are opaque: numeric columns are
/// carried through as-is, anything else is ignored.
pub fn read_metrics(bytes: &[u8], format: DataFormat) -> Result<MetricsTable, StoreError> {
    let df = read_dataframe(bytes, format)?;
    let all: Vec<usize> = (0..df.height()).collect();
    let mut warnings = Vec::new();
    let cols = numeric_columns(&df, None, &all, &mut warnings)?;
    Ok(MetricsTable::from_columns(cols))
}

/// Serialize a strategy table, including its date index when present.
pub fn write_table(table: &TimeSeriesTable, format: DataFormat) -> Result<Vec<u8>, StoreError> {
    let df = table_to_dataframe(table)?;
    write_dataframe(df, format)
}

/// Serialize a metrics table.
pub fn write_metrics(metrics: &MetricsTable, format: DataFormat) -> Result<Vec<u8>, StoreError> {
    let mut cols: Vec<Column> = Vec::with_capacity(metrics.columns().len());
    for (name, values) in metrics.columns() {
        cols.push(Series::new(name.as_str().into(), values.as_slice()).into_column());
    }
    let df = DataFrame::new(cols).map_err(|e| StoreError::Encode(e.to_string()))?;
    write_dataframe(df, format)
}

fn read_dataframe(bytes: &[u8], format: DataFormat) -> Result<DataFrame, StoreError> {
    let cursor = Cursor::new(bytes);
    match format {
        DataFormat::Parquet => ParquetReader::new(cursor).finish(),
        DataFormat::Ipc => IpcReader::new(cursor).finish(),
    }
    .map_err(|e| StoreError::Decode(e.to_string()))
}

fn write_dataframe(mut df: DataFrame, format: DataFormat) -> Result<Vec<u8>, StoreError> {
    let mut buffer = Vec::new();
    match format {
        DataFormat::Parquet => ParquetWriter::new(&mut buffer)
            .finish(&mut df)
            .map(|_| ()),
        DataFormat::Ipc => IpcWriter::new(&mut buffer).finish(&mut df),
    }
    .map_err(|e| StoreError::Encode(e.to_string()))?;
    Ok(buffer)
}

fn dataframe_to_table(df: &DataFrame) -> Result<(TimeSeriesTable, Vec<String>), StoreError> {
    let mut warnings = Vec::new();

    let date_col = df
        .get_columns()
        .iter()
        .find(|c| c.name().as_str() == columns::DATE);

    match date_col {
        Some(col) => {
            let dates = parse_dates(col.as_materialized_series())?;

            // Stable sort by date, dropping duplicates (first occurrence wins)
            // so the index comes out strictly increasing.
            let mut order: Vec<usize> = (0..dates.len()).collect();
            order.sort_by_key(|&i| dates[i]);
            let mut keep: Vec<usize> = Vec::with_capacity(order.len());
            let mut last: Option<DateTime<Utc>> = None;
            for i in order {
                if last == Some(dates[i]) {
                    warnings.push(format!("dropped duplicate date {}", dates[i]));
                } else {
                    keep.push(i);
                    last = Some(dates[i]);
                }
            }

            let index: Vec<DateTime<Utc>> = keep.iter().map(|&i| dates[i]).collect();
            let cols = numeric_columns(df, Some(columns::DATE), &keep, &mut warnings)?;
            Ok((
                TimeSeriesTable::from_columns(cols).with_index(index),
                warnings,
            ))
        }
        None => {
            warnings.push(format!(
                "missing '{}' column; proceeding without a time index",
                columns::DATE
            ));
            let all: Vec<usize> = (0..df.height()).collect();
            let cols = numeric_columns(df, None, &all, &mut warnings)?;
            Ok((TimeSeriesTable::from_columns(cols), warnings))
        }
    }
}

fn numeric_columns(
    df: &DataFrame,
    skip: Option<&str>,
    keep: &[usize],
    warnings: &mut Vec<String>,
) -> Result<Vec<(String, Vec<f64>)>, StoreError> {
    let mut out = Vec::new();
    for col in df.get_columns() {
        let name = col.name().as_str();
        if Some(name) == skip {
            continue;
        }
        let series = col.as_materialized_series();
        if !is_numeric(series.dtype()) {
            warnings.push(format!("skipped non-numeric column '{}'", name));
            continue;
        }
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let values: Vec<f64> = ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let reordered: Vec<f64> = keep.iter().map(|&i| values[i]).collect();
        out.push((name.to_string(), reordered));
    }
    Ok(out)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn parse_dates(series: &Series) -> Result<Vec<DateTime<Utc>>, StoreError> {
    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            epoch_dates(series, move |raw| match unit {
                TimeUnit::Nanoseconds => raw / 1_000_000,
                TimeUnit::Microseconds => raw / 1_000,
                TimeUnit::Milliseconds => raw,
            })
        }
        DataType::Date => epoch_dates(series, |days| days * 86_400_000),
        // Bare integers are taken as epoch milliseconds, the unit this crate
        // writes when no logical dtype survives serialization.
        DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
            epoch_dates(series, |raw| raw)
        }
        DataType::String => {
            let ca = series
                .str()
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            let mut out = Vec::with_capacity(series.len());
            for value in ca.into_iter() {
                let s = value.ok_or_else(|| {
                    StoreError::Decode(format!("null value in '{}' column", columns::DATE))
                })?;
                out.push(parse_date_str(s)?);
            }
            Ok(out)
        }
        other => Err(StoreError::Decode(format!(
            "unsupported dtype {:?} for '{}' column",
            other,
            columns::DATE
        ))),
    }
}

fn epoch_dates(
    series: &Series,
    to_millis: impl Fn(i64) -> i64,
) -> Result<Vec<DateTime<Utc>>, StoreError> {
    let casted = series
        .cast(&DataType::Int64)
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let ca = casted
        .i64()
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let mut out = Vec::with_capacity(series.len());
    for value in ca.into_iter() {
        let raw = value.ok_or_else(|| {
            StoreError::Decode(format!("null value in '{}' column", columns::DATE))
        })?;
        let ms = to_millis(raw);
        let dt = DateTime::from_timestamp_millis(ms).ok_or_else(|| {
            StoreError::Decode(format!("timestamp {} out of range in '{}' column", ms, columns::DATE))
        })?;
        out.push(dt);
    }
    Ok(out)
}

fn parse_date_str(s: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN).and_utc());
    }
    Err(StoreError::Decode(format!("unparseable date value '{}'", s)))
}

fn table_to_dataframe(table: &TimeSeriesTable) -> Result<DataFrame, StoreError> {
    let mut cols: Vec<Column> = Vec::with_capacity(table.columns().len() + 1);

    if table.has_time_index() {
        let millis: Vec<i64> = table.index().iter().map(|d| d.timestamp_millis()).collect();
        let date = Series::new(columns::DATE.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        cols.push(date.into_column());
    }
    for (name, values) in table.columns() {
        cols.push(Series::new(name.as_str().into(), values.as_slice()).into_column());
    }

    DataFrame::new(cols).map_err(|e| StoreError::Encode(e.to_string()))
}
