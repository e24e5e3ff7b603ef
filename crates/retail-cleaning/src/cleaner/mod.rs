//! Value-level cleaning primitives shared by every entity pipeline.
//!
//! This module provides functionality for:
//! - Normalizing null tokens and dropping incomplete rows
//! - Regex-based text repair
//! - Coercing text into numbers, dates and times
//! - Normalizing product weights to kilograms
//! - Invalidating whole records from a single bad field

mod converters;
mod invalidation;
mod sanitizers;
pub mod weight;

pub use converters::{
    CoercionStats, coerce_date, coerce_date_column, coerce_numeric, coerce_numeric_column,
    coerce_time, coerce_time_column,
};
pub use invalidation::{InvalidationScope, RowSelection, drop_rows, invalidate_rows};
pub use sanitizers::{
    drop_incomplete_rows, normalize_null_tokens, strip_pattern, strip_pattern_column,
    transform_text_column,
};
