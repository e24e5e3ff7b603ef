//! Date events: the month/day/year/time a sale happened.

use super::{CleaningContext, EntityPipeline};
use crate::cleaner::{InvalidationScope, RowSelection, coerce_numeric, coerce_time_column};
use crate::error::Result;
use crate::types::Entity;
use polars::prelude::*;

/// Cleans the `date_details` table.
///
/// A month that is not a number marks the whole record as corrupt. The month
/// text itself is kept; it only decides which rows survive.
pub struct EventPipeline;

impl EntityPipeline for EventPipeline {
    fn entity(&self) -> Entity {
        Entity::Events
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &["month", "timestamp"]
    }

    fn run(&self, df: DataFrame, ctx: &mut CleaningContext<'_>) -> Result<DataFrame> {
        let mut df = ctx.normalize_nulls(df)?;

        let corrupt = RowSelection::where_text(&df, "month", |month| {
            coerce_numeric(month).is_none()
        })?;
        ctx.invalidate(
            &mut df,
            &corrupt,
            InvalidationScope::AllColumns,
            "month is not numeric",
        )?;

        let stats = coerce_time_column(&mut df, "timestamp")?;
        ctx.record_coercion("timestamp", "time", stats);

        Ok(df)
    }
}
