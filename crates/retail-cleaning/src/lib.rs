//! Retail Cleaning Library
//!
//! The cleaning core of a retail data-centralisation pipeline, built with Rust
//! and Polars.
//!
//! # Overview
//!
//! Six business datasets (users, cards, stores, products, orders and date
//! events) arrive from heterogeneous sources with source-specific damage.
//! Each has a hard-coded pipeline that repairs it:
//!
//! - **Value coercion**: null tokens, dates in a dozen layouts, numbers with
//!   stray characters. A value that cannot be parsed becomes null; it is never
//!   an error.
//! - **Weight normalization**: `"3 x 200g"`, `"16oz"` or `"77g ."` become a
//!   kilogram float.
//! - **Row invalidation**: one corrupt field (an unparsable opening date, a
//!   price without `£`) nulls the rest of its record.
//! - **Orchestration**: extract from a [`TableSource`], clean, load into a
//!   [`TableSink`] under the warehouse table name.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use retail_cleaning::{CleaningOrchestrator, CsvTableSink, CsvTableSource, Entity};
//!
//! let orchestrator = CleaningOrchestrator::builder()
//!     .on_progress(|update| {
//!         println!("[{}] {:.0}% {}", update.entity, update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//!
//! // One entity from an in-memory table
//! let outcome = orchestrator.clean(Entity::Stores, raw_stores)?;
//! println!("{} rows invalidated", outcome.summary.rows_invalidated);
//!
//! // Everything, CSV in and CSV out
//! orchestrator.run_all(&CsvTableSource::new("raw"), &CsvTableSink::new("cleaned"))?;
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use retail_cleaning::CleaningConfig;
//!
//! let config = CleaningConfig::builder()
//!     .null_tokens(["NULL", "N/A", "None"])
//!     .coordinate_decimals(5)
//!     .weight_decimals(3)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod entities;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CoercionStats, InvalidationScope, RowSelection};
pub use config::{CleaningConfig, CleaningConfigBuilder, ConfigValidationError};
pub use entities::{
    CardPipeline, CleaningContext, EntityPipeline, EventPipeline, OrderPipeline, ProductPipeline,
    StorePipeline, UserPipeline, pipeline_for,
};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use io::{
    CsvTableSink, CsvTableSource, MemoryTables, SUMMARY_FILE_NAME, TableSink, TableSource,
    write_summary_report,
};
pub use pipeline::{
    CleaningOrchestrator, CleaningOrchestratorBuilder, CleaningStage, ClosureProgressReporter,
    ProgressReporter, ProgressUpdate,
};
pub use types::{
    ActionType, CleaningAction, CleaningOutcome, CleaningSummary, ColumnCoercion, Entity,
};
