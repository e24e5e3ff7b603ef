//! Text-level repairs: null tokens, incomplete rows, regex stripping.

use crate::error::Result;
use crate::utils::{column_names, text_series};
use polars::prelude::*;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::debug;

/// Replace cells exactly equal to one of `tokens` with null in every text column.
///
/// Matching is exact and case-sensitive: `"NULL"` is a token, `"null"` and
/// the empty string are not. Non-text columns are left untouched.
/// Returns the table and the number of cells replaced.
pub fn normalize_null_tokens(df: DataFrame, tokens: &[String]) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let tokens: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
    let mut total_replacements = 0;

    for col_name in column_names(&df) {
        let series = df.column(&col_name)?.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }

        let (cleaned, count) = replace_tokens_with_null(series, &tokens)?;
        if count > 0 {
            debug!("Replaced {} null tokens in '{}'", count, col_name);
            total_replacements += count;
            df.replace(&col_name, cleaned)?;
        }
    }

    Ok((df, total_replacements))
}

/// Replace token cells of a single text Series with null.
pub(crate) fn replace_tokens_with_null(
    series: &Series,
    tokens: &HashSet<&str>,
) -> Result<(Series, usize)> {
    let str_series = series.str()?;
    let mut cleaned_values = Vec::with_capacity(str_series.len());
    let mut replacement_count = 0;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) if tokens.contains(val) => {
                cleaned_values.push(None);
                replacement_count += 1;
            }
            other => cleaned_values.push(other),
        }
    }

    Ok((
        Series::new(series.name().clone(), cleaned_values),
        replacement_count,
    ))
}

/// Remove every row that holds at least one null, in any column.
///
/// Returns the table and the number of rows removed.
pub fn drop_incomplete_rows(df: DataFrame) -> Result<(DataFrame, usize)> {
    let height = df.height();
    let mut keep = vec![true; height];

    for column in df.get_columns() {
        if column.null_count() == 0 {
            continue;
        }
        let nulls = column.as_materialized_series().is_null();
        for (idx, is_null) in nulls.into_iter().enumerate() {
            if is_null.unwrap_or(false) {
                keep[idx] = false;
            }
        }
    }

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return Ok((df, 0));
    }

    let mask = BooleanChunked::new("keep".into(), keep.as_slice());
    let df = df.filter(&mask)?;
    debug!("Dropped {} incomplete rows", removed);
    Ok((df, removed))
}

/// Regex substitution on a single value; missing stays missing.
pub fn strip_pattern<'a>(
    value: Option<&'a str>,
    pattern: &Regex,
    replacement: &str,
) -> Option<Cow<'a, str>> {
    value.map(|v| pattern.replace_all(v, replacement))
}

/// Rewrite every non-null cell of a text column.
///
/// `transform` returns `None` to turn a cell into null. Returns the number of
/// cells whose value changed.
pub fn transform_text_column<F>(df: &mut DataFrame, column: &str, transform: F) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let series = text_series(df, column)?;
    let str_series = series.str()?;
    let mut values: Vec<Option<String>> = Vec::with_capacity(str_series.len());
    let mut changed = 0;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) => {
                let updated = transform(val);
                if updated.as_deref() != Some(val) {
                    changed += 1;
                }
                values.push(updated);
            }
            None => values.push(None),
        }
    }

    df.replace(column, Series::new(column.into(), values))?;
    Ok(changed)
}

/// Apply [`strip_pattern`] to every cell of a text column.
pub fn strip_pattern_column(
    df: &mut DataFrame,
    column: &str,
    pattern: &Regex,
    replacement: &str,
) -> Result<usize> {
    transform_text_column(df, column, |val| {
        strip_pattern(Some(val), pattern, replacement).map(Cow::into_owned)
    })
}
