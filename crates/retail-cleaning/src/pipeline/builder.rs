//! The cleaning orchestrator and its builder.
//!
//! The orchestrator is thin sequencing: it picks the pipeline for an entity,
//! runs it, reports progress and hands the cleaned table to a sink.

use crate::config::{CleaningConfig, ConfigValidationError};
use crate::entities::pipeline_for;
use crate::error::Result;
use crate::io::{TableSink, TableSource};
use crate::pipeline::progress::{
    CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::types::{CleaningOutcome, Entity};
use polars::prelude::*;
use std::sync::Arc;
use tracing::{error, info};

/// Runs entity pipelines against sources and sinks.
///
/// Use [`CleaningOrchestrator::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use retail_cleaning::{CleaningOrchestrator, CsvTableSink, CsvTableSource};
///
/// let orchestrator = CleaningOrchestrator::builder()
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?;
///
/// let outcomes = orchestrator.run_all(
///     &CsvTableSource::new("raw"),
///     &CsvTableSink::new("cleaned"),
/// )?;
/// ```
pub struct CleaningOrchestrator {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// The orchestrator may be moved to a worker thread; pipelines still run sequentially.
static_assertions::assert_impl_all!(CleaningOrchestrator: Send);

impl CleaningOrchestrator {
    /// Create a new orchestrator builder.
    pub fn builder() -> CleaningOrchestratorBuilder {
        CleaningOrchestratorBuilder::default()
    }

    /// The configuration every pipeline run uses.
    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Clean one raw table with the entity's pipeline.
    pub fn clean(&self, entity: Entity, df: DataFrame) -> Result<CleaningOutcome> {
        self.report_progress(ProgressUpdate::new(
            entity,
            CleaningStage::Cleaning,
            0.0,
            format!("Cleaning {} ({} rows)...", entity, df.height()),
        ));

        let outcome = pipeline_for(entity).clean(df, &self.config)?;

        self.report_progress(ProgressUpdate::new(
            entity,
            CleaningStage::Cleaning,
            1.0,
            format!("Cleaned {} ({} rows)", entity, outcome.data.height()),
        ));
        Ok(outcome)
    }

    /// Extract, clean and load one entity.
    ///
    /// The cleaned table is handed to `sink` under the entity's warehouse
    /// table name.
    pub fn run(
        &self,
        entity: Entity,
        source: &dyn TableSource,
        sink: &dyn TableSink,
    ) -> Result<CleaningOutcome> {
        match self.run_internal(entity, source, sink) {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete(
                    entity,
                    format!("Loaded {}", entity.warehouse_table()),
                ));
                Ok(outcome)
            }
            Err(e) => {
                error!("Cleaning {} failed: {}", entity, e);
                self.report_progress(ProgressUpdate::failed(entity, e.to_string()));
                Err(e)
            }
        }
    }

    /// Run every entity in order (users, cards, stores, products, orders,
    /// events), stopping at the first error.
    pub fn run_all(
        &self,
        source: &dyn TableSource,
        sink: &dyn TableSink,
    ) -> Result<Vec<CleaningOutcome>> {
        self.run_many(Entity::all(), source, sink)
    }

    /// Run the given entities in order, stopping at the first error.
    pub fn run_many(
        &self,
        entities: &[Entity],
        source: &dyn TableSource,
        sink: &dyn TableSink,
    ) -> Result<Vec<CleaningOutcome>> {
        let mut outcomes = Vec::with_capacity(entities.len());
        for entity in entities {
            outcomes.push(self.run(*entity, source, sink)?);
        }
        info!("Cleaned {} entities", outcomes.len());
        Ok(outcomes)
    }

    fn run_internal(
        &self,
        entity: Entity,
        source: &dyn TableSource,
        sink: &dyn TableSink,
    ) -> Result<CleaningOutcome> {
        self.report_progress(ProgressUpdate::new(
            entity,
            CleaningStage::Extracting,
            0.0,
            format!("Reading {}...", entity.source_name()),
        ));
        let raw = source.read_table(entity.source_name())?;
        info!(
            "Extracted {} ({} rows, {} columns)",
            entity.source_name(),
            raw.height(),
            raw.width()
        );

        let mut outcome = self.clean(entity, raw)?;

        self.report_progress(ProgressUpdate::new(
            entity,
            CleaningStage::Loading,
            0.0,
            format!("Writing {}...", entity.warehouse_table()),
        ));
        sink.write_table(entity.warehouse_table(), &mut outcome.data)?;

        Ok(outcome)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

/// Builder for [`CleaningOrchestrator`].
#[derive(Default)]
pub struct CleaningOrchestratorBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(CleaningOrchestratorBuilder: Send);

impl CleaningOrchestratorBuilder {
    /// Set the cleaning configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the orchestrator.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<CleaningOrchestrator, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(CleaningOrchestrator {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
