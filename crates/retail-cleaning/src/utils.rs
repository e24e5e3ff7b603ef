//! Shared helpers for working with raw tables.
//!
//! Column access, type checks and small numeric/date conversions used by
//! every entity pipeline.

use crate::error::{CleaningError, Result};
use chrono::{NaiveDate, NaiveTime, Timelike};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a column of this type can be read as text without losing meaning.
#[inline]
pub fn is_text_compatible_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Null | DataType::Boolean) || is_numeric_dtype(dtype)
}

// =============================================================================
// Column Access
// =============================================================================

/// Fail with [`CleaningError::MissingColumn`] unless every column is present.
pub fn require_columns(df: &DataFrame, entity: &str, columns: &[&str]) -> Result<()> {
    let present: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
    match columns.iter().find(|col| !present.contains(*col)) {
        Some(missing) => Err(CleaningError::missing_column(entity, *missing)),
        None => Ok(()),
    }
}

/// Get a column as a materialized Series.
pub fn column_series(df: &DataFrame, column: &str) -> Result<Series> {
    df.column(column)
        .map(|c| c.as_materialized_series().clone())
        .map_err(|_| CleaningError::missing_column("dataset", column))
}

/// Get a column as a `String` Series, casting numeric and all-null columns.
///
/// Any other type (lists, structs, temporal values) is a contract violation:
/// text rules would silently mangle it.
pub fn text_series(df: &DataFrame, column: &str) -> Result<Series> {
    let series = column_series(df, column)?;
    match series.dtype() {
        DataType::String => Ok(series),
        dtype if is_text_compatible_dtype(dtype) => Ok(series.cast(&DataType::String)?),
        other => Err(CleaningError::UnexpectedColumnType {
            column: column.to_string(),
            expected: "text".to_string(),
            found: other.to_string(),
        }),
    }
}

/// Collect column names as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Total number of null cells in the table.
pub fn null_cell_count(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

// =============================================================================
// Value Helpers
// =============================================================================

/// Round to a fixed number of decimal places (half away from zero).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as i32
}

/// Nanoseconds since midnight, the physical representation of a polars `Time`.
pub fn time_to_nanos(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1_000_000_000 + time.nanosecond() as i64
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================
