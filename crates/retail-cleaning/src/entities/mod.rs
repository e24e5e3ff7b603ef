//! Per-entity cleaning pipelines.
//!
//! Each pipeline is hard-coded to one raw schema and runs a fixed, ordered
//! list of steps. All of them share the [`EntityPipeline`] contract: check the
//! required columns, run the steps, return the cleaned table together with a
//! [`CleaningSummary`].

mod card;
mod event;
mod order;
mod product;
mod store;
mod user;

pub use card::CardPipeline;
pub use event::EventPipeline;
pub use order::OrderPipeline;
pub use product::ProductPipeline;
pub use store::StorePipeline;
pub use user::UserPipeline;

use crate::cleaner::{
    CoercionStats, InvalidationScope, RowSelection, invalidate_rows, normalize_null_tokens,
};
use crate::config::CleaningConfig;
use crate::error::{Result, ResultExt};
use crate::types::{ActionType, CleaningAction, CleaningOutcome, CleaningSummary, Entity};
use crate::utils::{null_cell_count, require_columns};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A cleaning pipeline for one entity.
pub trait EntityPipeline: Send + Sync {
    /// The entity this pipeline cleans.
    fn entity(&self) -> Entity;

    /// Raw columns that must be present before any step runs.
    fn required_columns(&self) -> &'static [&'static str];

    /// Run the ordered steps over a table whose schema has been checked.
    fn run(&self, df: DataFrame, ctx: &mut CleaningContext<'_>) -> Result<DataFrame>;

    /// Check the schema, run the steps and summarize what they did.
    ///
    /// A missing required column fails before any step runs. There is no
    /// partial result: the pipeline either completes or returns `Err`.
    fn clean(&self, df: DataFrame, config: &CleaningConfig) -> Result<CleaningOutcome> {
        let entity = self.entity();
        require_columns(&df, entity.as_str(), self.required_columns())?;

        let start_time = Instant::now();
        info!(
            "Cleaning {} ({} rows, {} columns)...",
            entity,
            df.height(),
            df.width()
        );

        let mut ctx = CleaningContext::new(entity, config);
        ctx.summary.rows_before = df.height();
        ctx.summary.columns_before = df.width();
        ctx.summary.null_cells_before = null_cell_count(&df);

        let data = self
            .run(df, &mut ctx)
            .context(format!("Failed to clean {}", entity))?;

        let mut summary = ctx.summary;
        summary.rows_after = data.height();
        summary.columns_after = data.width();
        summary.rows_removed = summary.rows_before.saturating_sub(summary.rows_after);
        summary.columns_removed = summary.columns_before.saturating_sub(summary.columns_after);
        summary.null_cells_after = null_cell_count(&data);
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Cleaned {}: {} -> {} rows, {} rows invalidated, {} cells degraded ({}ms)",
            entity,
            summary.rows_before,
            summary.rows_after,
            summary.rows_invalidated,
            summary.cells_degraded,
            summary.duration_ms
        );

        Ok(CleaningOutcome {
            entity,
            data,
            summary,
        })
    }
}

/// Get the pipeline for an entity.
pub fn pipeline_for(entity: Entity) -> Box<dyn EntityPipeline> {
    match entity {
        Entity::Users => Box::new(UserPipeline),
        Entity::Cards => Box::new(CardPipeline),
        Entity::Stores => Box::new(StorePipeline),
        Entity::Products => Box::new(ProductPipeline),
        Entity::Orders => Box::new(OrderPipeline),
        Entity::Events => Box::new(EventPipeline),
    }
}

/// State threaded through one pipeline invocation.
pub struct CleaningContext<'a> {
    pub config: &'a CleaningConfig,
    pub summary: CleaningSummary,
}

impl<'a> CleaningContext<'a> {
    pub fn new(entity: Entity, config: &'a CleaningConfig) -> Self {
        Self {
            config,
            summary: CleaningSummary::new(entity),
        }
    }

    /// Append an action to the audit trail.
    pub fn record(&mut self, action: CleaningAction) {
        debug!(
            "[{}] {}: {} ({} affected)",
            self.summary.entity,
            action.action_type.display_name(),
            action.description,
            action.affected
        );
        self.summary.add_action(action);
    }

    /// Record a text repair, skipping it when nothing changed.
    pub fn record_cleaned(&mut self, column: &str, description: impl Into<String>, changed: usize) {
        if changed > 0 {
            self.record(
                CleaningAction::new(ActionType::ValueCleaned, column, description)
                    .with_affected(changed),
            );
        }
    }

    /// Record the outcome of coercing a column.
    pub fn record_coercion(&mut self, column: &str, target_type: &str, stats: CoercionStats) {
        if stats.degraded > 0 {
            let message = format!(
                "{} value(s) in '{}' could not be parsed as {} and are now missing",
                stats.degraded, column, target_type
            );
            warn!("[{}] {}", self.summary.entity, message);
            self.summary.add_warning(message);
        }
        self.record(
            CleaningAction::new(
                ActionType::ValuesCoerced,
                column,
                format!("Coerced to {}", target_type),
            )
            .with_affected(stats.parsed),
        );
        self.summary.add_coercion(column, stats);
    }

    /// Null the scoped columns of every selected row and record it.
    ///
    /// Returns the number of cells that were cleared.
    pub fn invalidate(
        &mut self,
        df: &mut DataFrame,
        selection: &RowSelection,
        scope: InvalidationScope<'_>,
        reason: &str,
    ) -> Result<usize> {
        if selection.is_empty() {
            return Ok(0);
        }

        let cleared = invalidate_rows(df, selection, scope)?;
        let (action_type, target) = match scope {
            InvalidationScope::Only(&[column]) => (ActionType::FieldInvalidated, column),
            _ => (ActionType::RowsInvalidated, "dataset"),
        };

        if action_type == ActionType::RowsInvalidated {
            self.summary.rows_invalidated += selection.len();
            warn!(
                "[{}] Invalidated {} row(s): {}",
                self.summary.entity,
                selection.len(),
                reason
            );
        }

        self.record(
            CleaningAction::new(
                action_type,
                target,
                format!("{} ({} cells cleared)", reason, cleared),
            )
            .with_affected(selection.len()),
        );
        Ok(cleared)
    }

    /// Replace the configured null tokens with null in every text column.
    pub fn normalize_nulls(&mut self, df: DataFrame) -> Result<DataFrame> {
        let (df, replaced) = normalize_null_tokens(df, &self.config.null_tokens)?;
        if replaced > 0 {
            self.record(
                CleaningAction::new(
                    ActionType::NullTokensReplaced,
                    "dataset",
                    format!("Replaced {} null token(s)", replaced),
                )
                .with_affected(replaced),
            );
        }
        Ok(df)
    }
}
