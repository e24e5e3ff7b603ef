//! Row-level invalidation.
//!
//! Several entities treat one bad field as evidence that the whole record is
//! untrustworthy. Invalidation is done in two phases: a [`RowSelection`] is
//! computed from a single column, then [`invalidate_rows`] nulls the chosen
//! columns in exactly those rows.

use crate::error::{CleaningError, Result};
use crate::utils::{column_names, column_series, text_series};
use polars::prelude::*;
use std::collections::BTreeSet;

/// A set of row positions within one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSelection {
    rows: BTreeSet<usize>,
}

impl RowSelection {
    /// Select rows where `column` is null.
    pub fn where_null(df: &DataFrame, column: &str) -> Result<Self> {
        let nulls = column_series(df, column)?.is_null();
        Ok(nulls
            .into_iter()
            .enumerate()
            .filter_map(|(idx, is_null)| is_null.unwrap_or(false).then_some(idx))
            .collect())
    }

    /// Select rows whose text value satisfies `predicate` (null is passed as `None`).
    pub fn where_text<F>(df: &DataFrame, column: &str, predicate: F) -> Result<Self>
    where
        F: Fn(Option<&str>) -> bool,
    {
        let series = text_series(df, column)?;
        Ok(series
            .str()?
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| predicate(value).then_some(idx))
            .collect())
    }

    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row is selected.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `row` is selected.
    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    /// Selected positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().copied()
    }

    /// Boolean mask of length `height`, `true` for rows that are NOT selected.
    pub fn keep_mask(&self, height: usize) -> BooleanChunked {
        let keep: Vec<bool> = (0..height).map(|idx| !self.rows.contains(&idx)).collect();
        BooleanChunked::new("keep".into(), keep.as_slice())
    }
}

impl FromIterator<usize> for RowSelection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Which columns an invalidation touches.
#[derive(Debug, Clone, Copy)]
pub enum InvalidationScope<'a> {
    /// Every column of the table.
    AllColumns,
    /// Every column except the named ones (absent names are ignored).
    AllExcept(&'a [&'a str]),
    /// Only the named columns (each must exist).
    Only(&'a [&'a str]),
}

impl InvalidationScope<'_> {
    fn columns(&self, df: &DataFrame, entity: &str) -> Result<Vec<String>> {
        match self {
            Self::AllColumns => Ok(column_names(df)),
            Self::AllExcept(kept) => Ok(column_names(df)
                .into_iter()
                .filter(|name| !kept.contains(&name.as_str()))
                .collect()),
            Self::Only(named) => {
                let present = column_names(df);
                named
                    .iter()
                    .map(|name| {
                        if present.iter().any(|p| p == name) {
                            Ok(name.to_string())
                        } else {
                            Err(CleaningError::missing_column(entity, *name))
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Set the scoped columns to null in every selected row.
///
/// Column types are preserved. Returns the number of cells that held a value
/// before and are null now.
pub fn invalidate_rows(
    df: &mut DataFrame,
    selection: &RowSelection,
    scope: InvalidationScope<'_>,
) -> Result<usize> {
    if selection.is_empty() {
        return Ok(0);
    }

    let height = df.height();
    let keep = selection.keep_mask(height);
    let mut cells_cleared = 0;

    for name in scope.columns(df, "dataset")? {
        let series = column_series(df, &name)?;
        let nulls_before = series.null_count();
        let nulls = Series::full_null(series.name().clone(), height, series.dtype());
        let updated = series.zip_with(&keep, &nulls)?;
        cells_cleared += updated.null_count() - nulls_before;
        df.replace(&name, updated)?;
    }

    Ok(cells_cleared)
}

/// Remove the selected rows from the table.
pub fn drop_rows(df: DataFrame, selection: &RowSelection) -> Result<DataFrame> {
    if selection.is_empty() {
        return Ok(df);
    }
    let keep = selection.keep_mask(df.height());
    Ok(df.filter(&keep)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df!(
            "index" => &["0", "1", "2"],
            "name" => &[Some("a"), Some("b"), None],
            "lon" => &[Some(1.5), Some(2.5), Some(3.5)]
        )
        .unwrap()
    }

    #[test]
    fn test_where_null() {
        let df = sample();
        let selection = RowSelection::where_null(&df, "name").unwrap();
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_where_text() {
        let df = sample();
        let selection =
            RowSelection::where_text(&df, "name", |v| v.is_some_and(|s| s == "b")).unwrap();
        assert!(selection.contains(1));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_invalidate_all_except_index() {
        let mut df = sample();
        let selection: RowSelection = [1].into_iter().collect();
        let cleared =
            invalidate_rows(&mut df, &selection, InvalidationScope::AllExcept(&["index"])).unwrap();

        assert_eq!(cleared, 2);
        let index = df.column("index").unwrap().str().unwrap().clone();
        assert_eq!(index.get(1), Some("1"));
        assert_eq!(df.column("name").unwrap().str().unwrap().get(1), None);
        assert_eq!(df.column("name").unwrap().str().unwrap().get(0), Some("a"));

        let lon = df.column("lon").unwrap();
        assert_eq!(lon.dtype(), &DataType::Float64);
        assert_eq!(lon.as_materialized_series().f64().unwrap().get(1), None);
        assert_eq!(lon.as_materialized_series().f64().unwrap().get(2), Some(3.5));
    }

    #[test]
    fn test_invalidate_only_requires_columns() {
        let mut df = sample();
        let selection: RowSelection = [0].into_iter().collect();
        let err = invalidate_rows(&mut df, &selection, InvalidationScope::Only(&["missing"]))
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_invalidate_all_columns() {
        let mut df = sample();
        let selection: RowSelection = [0, 2].into_iter().collect();
        invalidate_rows(&mut df, &selection, InvalidationScope::AllColumns).unwrap();
        assert_eq!(df.column("index").unwrap().null_count(), 2);
        assert_eq!(df.column("lon").unwrap().null_count(), 2);
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_drop_rows() {
        let df = sample();
        let selection: RowSelection = [0].into_iter().collect();
        let df = drop_rows(df, &selection).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("index").unwrap().str().unwrap().get(0), Some("1"));
    }
}
