//! Store details.

use super::{CleaningContext, EntityPipeline};
use crate::cleaner::{
    InvalidationScope, RowSelection, coerce_date_column, coerce_numeric_column,
    strip_pattern_column, transform_text_column,
};
use crate::error::Result;
use crate::types::Entity;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n").expect("Invalid regex: line breaks"));
static LETTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]").expect("Invalid regex: letters"));

/// Cleans the `store_details` table.
///
/// An unparsable opening date marks the whole record as corrupt: every
/// column of that row except `index` is nulled.
pub struct StorePipeline;

impl EntityPipeline for StorePipeline {
    fn entity(&self) -> Entity {
        Entity::Stores
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "index",
            "address",
            "longitude",
            "latitude",
            "continent",
            "staff_numbers",
            "opening_date",
        ]
    }

    fn run(&self, df: DataFrame, ctx: &mut CleaningContext<'_>) -> Result<DataFrame> {
        let mut df = ctx.normalize_nulls(df)?;

        let changed = strip_pattern_column(&mut df, "address", &LINE_BREAKS, ",")?;
        ctx.record_cleaned("address", "Replaced line breaks with ','", changed);

        let stats = coerce_date_column(&mut df, "opening_date", None)?;
        ctx.record_coercion("opening_date", "date", stats);

        let corrupt = RowSelection::where_null(&df, "opening_date")?;
        ctx.invalidate(
            &mut df,
            &corrupt,
            InvalidationScope::AllExcept(&["index"]),
            "opening date is missing or unparsable",
        )?;

        let changed = transform_text_column(&mut df, "continent", |continent| {
            Some(continent.strip_prefix("ee").unwrap_or(continent).to_string())
        })?;
        ctx.record_cleaned("continent", "Stripped leading 'ee'", changed);

        let decimals = ctx.config.coordinate_decimals;
        for column in ["longitude", "latitude"] {
            let stats = coerce_numeric_column(&mut df, column, Some(decimals))?;
            ctx.record_coercion(column, "float", stats);
        }

        let changed = strip_pattern_column(&mut df, "staff_numbers", &LETTERS, "")?;
        ctx.record_cleaned("staff_numbers", "Stripped letters", changed);

        Ok(df)
    }
}
