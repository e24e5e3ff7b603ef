//! Coercion of raw text into numbers, dates and times.
//!
//! Scalar coercions never fail: an unparsable value becomes `None`. The column
//! forms replace the column with a typed one and report how many cells parsed,
//! how many degraded to null and how many were null to begin with.

use crate::error::Result;
use crate::utils::{
    column_series, date_to_epoch_days, is_numeric_dtype, round_to, text_series, time_to_nanos,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Date layouts seen across the raw sources, tried in order.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d", "%Y/%m/%d", "%Y %B %d", "%B %Y %d", "%d %B %Y", "%B %d %Y", "%m/%d/%Y",
];

/// Datetime layouts whose date or time portion is kept.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Time-of-day layouts, tried in order.
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Outcome counts of coercing one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionStats {
    /// Cells that parsed into the target type.
    pub parsed: usize,
    /// Cells that held a value which failed to parse and are now null.
    pub degraded: usize,
    /// Cells that were null before coercion.
    pub already_missing: usize,
}

impl CoercionStats {
    fn record<T>(&mut self, raw: Option<&str>, coerced: &Option<T>) {
        match (raw, coerced) {
            (None, _) => self.already_missing += 1,
            (Some(_), Some(_)) => self.parsed += 1,
            (Some(_), None) => self.degraded += 1,
        }
    }
}

// =============================================================================
// Scalar Coercion
// =============================================================================

/// Parse a value as `f64`. Non-numeric text and NaN become `None`.
pub fn coerce_numeric(value: Option<&str>) -> Option<f64> {
    let parsed = value?.trim().parse::<f64>().ok()?;
    (!parsed.is_nan()).then_some(parsed)
}

/// Parse a value as a calendar date.
///
/// With `format_hint` the value must match that `chrono` format exactly.
/// Without it, the known source layouts are tried in turn, including
/// datetimes whose date portion is kept.
pub fn coerce_date(value: Option<&str>, format_hint: Option<&str>) -> Option<NaiveDate> {
    let value = value?;

    if let Some(format) = format_hint {
        return NaiveDate::parse_from_str(value, format).ok();
    }

    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| parse_datetime(trimmed).map(|dt| dt.date()))
}

/// Parse a value as a time of day, discarding any date portion.
pub fn coerce_time(value: Option<&str>) -> Option<NaiveTime> {
    let trimmed = value?.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .or_else(|| parse_datetime(trimmed).map(|dt| dt.time()))
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

// =============================================================================
// Column Coercion
// =============================================================================

/// Replace a column with its `Float64` coercion, optionally rounded.
///
/// Numeric columns are cast directly; text columns are parsed cell by cell.
pub fn coerce_numeric_column(
    df: &mut DataFrame,
    column: &str,
    decimals: Option<u32>,
) -> Result<CoercionStats> {
    let source = column_series(df, column)?;
    let mut stats = CoercionStats::default();

    let values: Vec<Option<f64>> = if is_numeric_dtype(source.dtype()) {
        let floats = source.cast(&DataType::Float64)?;
        floats
            .f64()?
            .into_iter()
            .map(|opt| {
                match opt {
                    Some(_) => stats.parsed += 1,
                    None => stats.already_missing += 1,
                }
                opt
            })
            .collect()
    } else {
        let text = text_series(df, column)?;
        text.str()?
            .into_iter()
            .map(|raw| {
                let coerced = coerce_numeric(raw);
                stats.record(raw, &coerced);
                coerced
            })
            .collect()
    };

    let values: Vec<Option<f64>> = match decimals {
        Some(places) => values
            .into_iter()
            .map(|v| v.map(|x| round_to(x, places)))
            .collect(),
        None => values,
    };

    df.replace(column, Series::new(column.into(), values))?;
    Ok(stats)
}

/// Replace a text column with its `Date` coercion.
///
/// A column that is already a `Date` is left alone.
pub fn coerce_date_column(
    df: &mut DataFrame,
    column: &str,
    format_hint: Option<&str>,
) -> Result<CoercionStats> {
    let source = column_series(df, column)?;
    let mut stats = CoercionStats::default();

    if source.dtype() == &DataType::Date {
        stats.already_missing = source.null_count();
        stats.parsed = source.len() - stats.already_missing;
        return Ok(stats);
    }

    let text = text_series(df, column)?;
    let days: Vec<Option<i32>> = text
        .str()?
        .into_iter()
        .map(|raw| {
            let coerced = coerce_date(raw, format_hint);
            stats.record(raw, &coerced);
            coerced.map(date_to_epoch_days)
        })
        .collect();

    let dates = Series::new(column.into(), days).cast(&DataType::Date)?;
    df.replace(column, dates)?;
    Ok(stats)
}

/// Replace a text column with its `Time` coercion.
pub fn coerce_time_column(df: &mut DataFrame, column: &str) -> Result<CoercionStats> {
    let source = column_series(df, column)?;
    let mut stats = CoercionStats::default();

    if source.dtype() == &DataType::Time {
        stats.already_missing = source.null_count();
        stats.parsed = source.len() - stats.already_missing;
        return Ok(stats);
    }

    let text = text_series(df, column)?;
    let nanos: Vec<Option<i64>> = text
        .str()?
        .into_iter()
        .map(|raw| {
            let coerced = coerce_time(raw);
            stats.record(raw, &coerced);
            coerced.map(time_to_nanos)
        })
        .collect();

    let times = Series::new(column.into(), nanos).cast(&DataType::Time)?;
    df.replace(column, times)?;
    Ok(stats)
}
