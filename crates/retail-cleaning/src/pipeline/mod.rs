//! Pipeline module.
//!
//! This module provides the cleaning orchestrator and progress reporting.

mod builder;
pub mod progress;

pub use builder::{CleaningOrchestrator, CleaningOrchestratorBuilder};
pub use progress::{CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
