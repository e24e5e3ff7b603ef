//! Product catalogue.

use super::{CleaningContext, EntityPipeline};
use crate::cleaner::weight::{normalize_weight, strip_kg_suffix, strip_trailing_period};
use crate::cleaner::{
    CoercionStats, InvalidationScope, RowSelection, coerce_date_column, transform_text_column,
};
use crate::error::Result;
use crate::types::{ActionType, CleaningAction, Entity};
use crate::utils::text_series;
use polars::prelude::*;

/// Raw name of the positional index column written by the upstream export.
const RAW_INDEX: &str = "Unnamed: 0";

/// Cleans the `products` table.
///
/// A price without the currency marker marks the record as corrupt; weights
/// end up as bare kilogram floats.
pub struct ProductPipeline;

impl EntityPipeline for ProductPipeline {
    fn entity(&self) -> Entity {
        Entity::Products
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[RAW_INDEX, "product_price", "weight", "date_added"]
    }

    fn run(&self, df: DataFrame, ctx: &mut CleaningContext<'_>) -> Result<DataFrame> {
        let mut df = df;
        let config = ctx.config;
        let marker = config.currency_marker.as_str();

        let corrupt = RowSelection::where_text(&df, "product_price", |price| {
            !price.is_some_and(|p| p.contains(marker))
        })?;
        ctx.invalidate(
            &mut df,
            &corrupt,
            InvalidationScope::AllExcept(&[RAW_INDEX]),
            "price lacks the currency marker",
        )?;

        let changed = transform_text_column(&mut df, "weight", |w| strip_trailing_period(Some(w)))?;
        ctx.record_cleaned("weight", "Stripped trailing '.'", changed);

        let stats = coerce_date_column(&mut df, "date_added", None)?;
        ctx.record_coercion("date_added", "date", stats);

        df.rename(RAW_INDEX, "index".into())?;
        ctx.record(CleaningAction::new(
            ActionType::ColumnRenamed,
            RAW_INDEX,
            "Renamed to 'index'",
        ));

        let changed = transform_text_column(&mut df, "product_price", |price| {
            Some(price.replace(marker, ""))
        })?;
        ctx.record_cleaned(
            "product_price",
            format!("Stripped '{}'", marker),
            changed,
        );

        let stats = weight_to_kg_column(&mut df, "weight", config.weight_decimals)?;
        ctx.record_coercion("weight", "kilograms", stats);

        Ok(df)
    }
}

/// Run the weight normalizer over a column and store bare kilogram floats.
fn weight_to_kg_column(df: &mut DataFrame, column: &str, decimals: u32) -> Result<CoercionStats> {
    let raw = text_series(df, column)?;
    let mut stats = CoercionStats::default();

    let kilograms: Vec<Option<f64>> = raw
        .str()?
        .into_iter()
        .map(|weight| {
            let kg = normalize_weight(weight, decimals);
            let value = strip_kg_suffix(kg.as_deref());
            match (weight, value) {
                (None, _) => stats.already_missing += 1,
                (Some(_), Some(_)) => stats.parsed += 1,
                (Some(_), None) => stats.degraded += 1,
            }
            value
        })
        .collect();

    df.replace(column, Series::new(column.into(), kilograms))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningConfig;
    use pretty_assertions::assert_eq;

    fn products() -> DataFrame {
        df!(
            "Unnamed: 0" => &["0", "1", "2", "3", "4"],
            "product_name" => &["Tent", "Mug", "Jam", "Cereal", "Bricks"],
            "product_price" => &[Some("£19.99"), Some("19.99"), Some("£2.50"), Some("£4.00"), Some("£7.10")],
            "weight" => &[Some("3 x 200g"), Some("1kg"), Some("16oz"), Some("77g ."), Some("5 lbs")],
            "date_added" => &[Some("2005-12-02"), Some("2006-01-01"), Some("1999 October 26"), Some("bad"), Some("2020-02-02")]
        )
        .unwrap()
    }

    fn text(df: &DataFrame, column: &str, idx: usize) -> Option<String> {
        df.column(column)
            .unwrap()
            .cast(&DataType::String)
            .unwrap()
            .str()
            .unwrap()
            .get(idx)
            .map(str::to_string)
    }

    fn weight(df: &DataFrame, idx: usize) -> Option<f64> {
        df.column("weight")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(idx)
    }

    #[test]
    fn test_price_without_marker_invalidates_row() {
        let outcome = ProductPipeline.clean(products(), &CleaningConfig::default()).unwrap();
        let data = &outcome.data;

        assert_eq!(text(data, "index", 1).as_deref(), Some("1"));
        for column in ["product_name", "product_price", "weight", "date_added"] {
            assert_eq!(text(data, column, 1), None, "column {column} should be null");
        }
        assert_eq!(outcome.summary.rows_invalidated, 1);
    }

    #[test]
    fn test_price_with_marker_keeps_data() {
        let outcome = ProductPipeline.clean(products(), &CleaningConfig::default()).unwrap();
        let data = &outcome.data;

        assert_eq!(text(data, "product_price", 0).as_deref(), Some("19.99"));
        assert_eq!(text(data, "product_name", 0).as_deref(), Some("Tent"));
        assert_eq!(data.column("product_price").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_weights_become_kilograms() {
        let outcome = ProductPipeline.clean(products(), &CleaningConfig::default()).unwrap();
        let data = &outcome.data;

        assert_eq!(data.column("weight").unwrap().dtype(), &DataType::Float64);
        assert_eq!(weight(data, 0), Some(0.6));
        assert_eq!(weight(data, 1), None);
        assert_eq!(weight(data, 2), Some(0.454));
        assert_eq!(weight(data, 3), Some(0.077));
        assert_eq!(weight(data, 4), None);

        let stats = outcome.summary.coercion_for("weight").unwrap();
        assert_eq!(stats.parsed, 3);
        assert_eq!(stats.degraded, 1);
        assert_eq!(stats.already_missing, 1);
    }

    #[test]
    fn test_index_renamed_and_dates_coerced() {
        let outcome = ProductPipeline.clean(products(), &CleaningConfig::default()).unwrap();
        let data = &outcome.data;

        assert!(data.column("Unnamed: 0").is_err());
        assert_eq!(data.column("date_added").unwrap().dtype(), &DataType::Date);
        assert_eq!(text(data, "date_added", 2).as_deref(), Some("1999-10-26"));
        assert_eq!(text(data, "date_added", 3), None);
    }

    #[test]
    fn test_missing_price_counts_as_lacking_marker() {
        let df = df!(
            "Unnamed: 0" => &["0"],
            "product_price" => &[None::<&str>],
            "weight" => &[Some("1kg")],
            "date_added" => &[Some("2005-12-02")]
        )
        .unwrap();

        let outcome = ProductPipeline.clean(df, &CleaningConfig::default()).unwrap();
        assert_eq!(weight(&outcome.data, 0), None);
        assert_eq!(outcome.summary.rows_invalidated, 1);
    }
}
