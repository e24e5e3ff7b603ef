//! Progress reporting for orchestrated cleaning runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use retail_cleaning::{CleaningOrchestrator, Entity};
//!
//! let outcome = CleaningOrchestrator::builder()
//!     .on_progress(|update| {
//!         println!("[{}] {:.0}% {}", update.entity, update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .clean(Entity::Stores, raw_stores)?;
//! ```

use crate::types::Entity;
use serde::{Deserialize, Serialize};

/// Stages of one entity's extract-clean-load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Reading the raw table from its source
    Extracting,
    /// Running the entity pipeline
    Cleaning,
    /// Handing the cleaned table to its sink
    Loading,
    /// Entity finished successfully
    Complete,
    /// Entity failed with an error
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Extracting => "Extracting",
            Self::Cleaning => "Cleaning Data",
            Self::Loading => "Loading",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of an entity run spent in this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Extracting => 0.2,
            Self::Cleaning => 0.6,
            Self::Loading => 0.2,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Extracting => 0.0,
            Self::Cleaning => 0.2,
            Self::Loading => 0.8,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A progress notification for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub entity: Entity,
    pub stage: CleaningStage,
    /// Progress of this entity's run (0.0 - 1.0)
    pub progress: f32,
    pub message: String,
}

impl ProgressUpdate {
    /// Creates an update at `stage_progress` (0.0 - 1.0) through `stage`.
    pub fn new(
        entity: Entity,
        stage: CleaningStage,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        let progress = stage.base_progress() + stage.weight() * stage_progress.clamp(0.0, 1.0);
        Self {
            entity,
            stage,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a completion update.
    pub fn complete(entity: Entity, message: impl Into<String>) -> Self {
        Self {
            entity,
            stage: CleaningStage::Complete,
            progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failure update.
    pub fn failed(entity: Entity, message: impl Into<String>) -> Self {
        Self {
            entity,
            stage: CleaningStage::Failed,
            progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from the orchestrator.
///
/// Implementations must be `Send + Sync` so the orchestrator can be moved to a
/// worker thread while reporting back to the caller.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
