use crate::cleaner::CoercionStats;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entities
// ============================================================================

/// The business datasets handled by the cleaning core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Users,
    Cards,
    Stores,
    Products,
    Orders,
    Events,
}

impl Entity {
    /// Every entity, in the order a full run processes them.
    pub const ALL: [Entity; 6] = [
        Self::Users,
        Self::Cards,
        Self::Stores,
        Self::Products,
        Self::Orders,
        Self::Events,
    ];

    pub fn all() -> &'static [Entity] {
        &Self::ALL
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Cards => "cards",
            Self::Stores => "stores",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Events => "events",
        }
    }

    /// Name of the raw dataset this entity is extracted from.
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Users => "legacy_users",
            Self::Cards => "card_details",
            Self::Stores => "store_details",
            Self::Products => "products",
            Self::Orders => "orders_table",
            Self::Events => "date_details",
        }
    }

    /// Name of the warehouse table the cleaned data is loaded into.
    pub fn warehouse_table(&self) -> &'static str {
        match self {
            Self::Users => "dim_users",
            Self::Cards => "dim_card_details",
            Self::Stores => "dim_store_details",
            Self::Products => "dim_products",
            Self::Orders => "orders_table",
            Self::Events => "dim_date_times",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Cleaning Summary
// ============================================================================

/// What a single pipeline run did to its table.
///
/// Serialized by the CLI's `--json` mode and written next to the cleaned
/// tables, so the audit trail survives the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub entity: Entity,

    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,

    pub columns_before: usize,
    pub columns_after: usize,
    pub columns_removed: usize,

    /// Null cells in the raw table, before null tokens were normalized.
    pub null_cells_before: usize,
    pub null_cells_after: usize,

    /// Cells that held a value and were degraded to null by a failed parse.
    pub cells_degraded: usize,
    /// Rows whose fields were cascaded to null by an invalidation rule.
    pub rows_invalidated: usize,

    /// Ordered audit trail of the steps taken.
    pub actions: Vec<CleaningAction>,

    /// Per-column coercion outcomes.
    pub coercions: Vec<ColumnCoercion>,

    pub warnings: Vec<String>,
}

impl CleaningSummary {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            duration_ms: 0,
            rows_before: 0,
            rows_after: 0,
            rows_removed: 0,
            columns_before: 0,
            columns_after: 0,
            columns_removed: 0,
            null_cells_before: 0,
            null_cells_after: 0,
            cells_degraded: 0,
            rows_invalidated: 0,
            actions: Vec::new(),
            coercions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: CleaningAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record the outcome of coercing one column.
    pub fn add_coercion(&mut self, column: impl Into<String>, stats: CoercionStats) {
        self.cells_degraded += stats.degraded;
        self.coercions.push(ColumnCoercion {
            column: column.into(),
            stats,
        });
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }

    /// Actions of one kind, in the order they were taken.
    pub fn actions_of(&self, action_type: ActionType) -> impl Iterator<Item = &CleaningAction> {
        self.actions
            .iter()
            .filter(move |action| action.action_type == action_type)
    }

    /// Coercion outcome for a column, if that column was coerced.
    pub fn coercion_for(&self, column: &str) -> Option<&CoercionStats> {
        self.coercions
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.stats)
    }
}

/// A single step taken by a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningAction {
    pub action_type: ActionType,
    /// Column name, or "dataset" for whole-table steps.
    pub target: String,
    pub description: String,
    /// Number of cells or rows the step touched.
    pub affected: usize,
}

impl CleaningAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            affected: 0,
        }
    }

    pub fn with_affected(mut self, affected: usize) -> Self {
        self.affected = affected;
        self
    }
}

/// Kinds of steps a pipeline can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Cells equal to a null token were replaced with null.
    NullTokensReplaced,
    /// One or more rows were removed.
    RowsRemoved,
    /// A column was removed.
    ColumnRemoved,
    /// A column was renamed.
    ColumnRenamed,
    /// Text values were repaired in place.
    ValueCleaned,
    /// A column was coerced to a typed representation.
    ValuesCoerced,
    /// Whole rows were invalidated from one bad field.
    RowsInvalidated,
    /// A dependent field was invalidated alongside another.
    FieldInvalidated,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NullTokensReplaced => "Null Tokens Replaced",
            Self::RowsRemoved => "Rows Removed",
            Self::ColumnRemoved => "Column Removed",
            Self::ColumnRenamed => "Column Renamed",
            Self::ValueCleaned => "Value Cleaned",
            Self::ValuesCoerced => "Values Coerced",
            Self::RowsInvalidated => "Rows Invalidated",
            Self::FieldInvalidated => "Field Invalidated",
        }
    }
}

/// Coercion outcome for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnCoercion {
    pub column: String,
    #[serde(flatten)]
    pub stats: CoercionStats,
}

/// The cleaned table together with the record of how it was produced.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub entity: Entity,
    pub data: DataFrame,
    pub summary: CleaningSummary,
}

// ============================================================================
// Tests
// ============================================================================
