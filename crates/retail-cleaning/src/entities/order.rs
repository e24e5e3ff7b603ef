//! Orders table.

use super::{CleaningContext, EntityPipeline};
use crate::error::Result;
use crate::types::{ActionType, CleaningAction, Entity};
use polars::prelude::*;

/// Columns that carry no information the warehouse keeps: customer names
/// live in the user dimension, `1` is a stray export index.
const DROPPED_COLUMNS: [&str; 3] = ["first_name", "last_name", "1"];

/// Cleans the `orders_table` table.
pub struct OrderPipeline;

impl EntityPipeline for OrderPipeline {
    fn entity(&self) -> Entity {
        Entity::Orders
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &DROPPED_COLUMNS
    }

    fn run(&self, df: DataFrame, ctx: &mut CleaningContext<'_>) -> Result<DataFrame> {
        let mut df = df;
        for column in DROPPED_COLUMNS {
            df = df.drop(column)?;
            ctx.record(CleaningAction::new(
                ActionType::ColumnRemoved,
                column,
                "Dropped column",
            ));
        }
        Ok(df)
    }
}
