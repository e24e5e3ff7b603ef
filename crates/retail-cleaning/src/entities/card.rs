//! Card payment details.

use super::{CleaningContext, EntityPipeline};
use crate::cleaner::{InvalidationScope, RowSelection, coerce_date_column, strip_pattern_column};
use crate::error::Result;
use crate::types::Entity;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

static QUESTION_MARKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?").expect("Invalid regex: question marks"));

/// Cleans the `card_details` table.
pub struct CardPipeline;

impl EntityPipeline for CardPipeline {
    fn entity(&self) -> Entity {
        Entity::Cards
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "card_number",
            "expiry_date",
            "card_provider",
            "date_payment_confirmed",
        ]
    }

    fn run(&self, df: DataFrame, ctx: &mut CleaningContext<'_>) -> Result<DataFrame> {
        let mut df = ctx.normalize_nulls(df)?;

        let changed = strip_pattern_column(&mut df, "card_number", &QUESTION_MARKS, "")?;
        ctx.record_cleaned("card_number", "Stripped '?'", changed);

        for column in ["card_number", "expiry_date"] {
            let selection = RowSelection::where_text(&df, column, contains_letter)?;
            ctx.invalidate(
                &mut df,
                &selection,
                InvalidationScope::Only(&[column]),
                "value contains letters",
            )?;
        }

        let orphaned = RowSelection::where_null(&df, "card_number")?;
        ctx.invalidate(
            &mut df,
            &orphaned,
            InvalidationScope::Only(&["card_provider"]),
            "card number is missing",
        )?;

        let config = ctx.config;
        let stats = coerce_date_column(
            &mut df,
            "date_payment_confirmed",
            Some(&config.card_date_format),
        )?;
        ctx.record_coercion("date_payment_confirmed", "date", stats);

        Ok(df)
    }
}

fn contains_letter(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.chars().any(|c| c.is_ascii_alphabetic()))
}
