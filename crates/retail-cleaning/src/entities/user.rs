//! Legacy user records.

use super::{CleaningContext, EntityPipeline};
use crate::cleaner::{
    RowSelection, coerce_date_column, drop_incomplete_rows, drop_rows, strip_pattern_column,
    transform_text_column,
};
use crate::error::Result;
use crate::types::{ActionType, CleaningAction, Entity};
use crate::utils::{capitalize, column_series};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashSet;

/// Temporary column carrying each row's raw position across row drops.
const ROW_POSITION: &str = "__row_position";

static NAME_PHONE_JUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.,x]").expect("Invalid regex: name/phone junk"));
static PHONE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[- ]").expect("Invalid regex: phone separators"));
static ADDRESS_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/,\n]").expect("Invalid regex: address breaks"));

/// Cleans the `legacy_users` table.
pub struct UserPipeline;

impl EntityPipeline for UserPipeline {
    fn entity(&self) -> Entity {
        Entity::Users
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "first_name",
            "last_name",
            "date_of_birth",
            "country_code",
            "address",
            "phone_number",
            "join_date",
        ]
    }

    fn run(&self, df: DataFrame, ctx: &mut CleaningContext<'_>) -> Result<DataFrame> {
        let df = ctx.normalize_nulls(df)?;
        let df = df.with_row_index(ROW_POSITION.into(), None)?;

        let (df, removed) = drop_incomplete_rows(df)?;
        if removed > 0 {
            ctx.record(
                CleaningAction::new(
                    ActionType::RowsRemoved,
                    "dataset",
                    format!("Removed {} row(s) with a missing value", removed),
                )
                .with_affected(removed),
            );
        }

        let mut df = df;
        let changed = transform_text_column(&mut df, "country_code", |code| {
            Some(code.replace("GGB", "GB"))
        })?;
        ctx.record_cleaned("country_code", "Replaced 'GGB' with 'GB'", changed);

        let config = ctx.config;
        let mut df = drop_denylisted_rows(df, &config.user_row_denylist, ctx)?;

        for column in ["first_name", "phone_number"] {
            let changed = strip_pattern_column(&mut df, column, &NAME_PHONE_JUNK, "")?;
            ctx.record_cleaned(column, "Stripped '.', ',' and 'x'", changed);
        }

        for column in ["first_name", "last_name"] {
            let changed = transform_text_column(&mut df, column, |name| Some(capitalize(name)))?;
            ctx.record_cleaned(column, "Capitalized", changed);
        }

        let changed = transform_text_column(&mut df, "phone_number", |phone| {
            Some(normalize_phone(phone))
        })?;
        ctx.record_cleaned("phone_number", "Normalized to 00 international form", changed);

        let changed = strip_pattern_column(&mut df, "address", &ADDRESS_BREAKS, ",")?;
        ctx.record_cleaned("address", "Replaced line breaks and slashes with ','", changed);

        for column in ["date_of_birth", "join_date"] {
            let stats = coerce_date_column(&mut df, column, None)?;
            ctx.record_coercion(column, "date", stats);
        }

        Ok(df)
    }
}

/// Remove rows whose raw position is in `denylist`.
///
/// Positions refer to the table as extracted. A position whose row was
/// already dropped is ignored. The position column is removed afterwards.
fn drop_denylisted_rows(
    df: DataFrame,
    denylist: &[usize],
    ctx: &mut CleaningContext<'_>,
) -> Result<DataFrame> {
    let denied: HashSet<u64> = denylist.iter().map(|&pos| pos as u64).collect();
    let positions = column_series(&df, ROW_POSITION)?.cast(&DataType::UInt64)?;

    let selection: RowSelection = positions
        .u64()?
        .into_iter()
        .enumerate()
        .filter_map(|(idx, pos)| pos.is_some_and(|p| denied.contains(&p)).then_some(idx))
        .collect();

    let removed = selection.len();
    let df = drop_rows(df, &selection)?;
    if removed > 0 {
        ctx.record(
            CleaningAction::new(
                ActionType::RowsRemoved,
                "dataset",
                format!("Removed {} denylisted row(s)", removed),
            )
            .with_affected(removed),
        );
    }

    Ok(df.drop(ROW_POSITION)?)
}

/// Bring a phone number into `00<country><number>` form.
///
/// A leading `+` is dropped, `00` is prefixed when absent, and dashes and
/// spaces are removed. Other whitespace is left alone.
fn normalize_phone(phone: &str) -> String {
    let phone = phone.strip_prefix('+').unwrap_or(phone);
    let phone = if phone.starts_with("00") {
        phone.to_string()
    } else {
        format!("00{}", phone)
    };
    PHONE_SEPARATORS.replace_all(&phone, "").into_owned()
}
