//! Error types for the cleaning core.
//!
//! Data-quality problems never surface here: a bad date or a non-numeric
//! field degrades to a null cell and is counted in the cleaning summary.
//! `CleaningError` is reserved for contract violations (a missing column,
//! a column of the wrong type) and for the I/O done by sources and sinks.
//!
//! Errors are serializable so a caller can forward them as `{code, message}`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning core.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// A column the entity's raw schema requires is absent.
    #[error("{entity} table is missing required column '{column}'")]
    MissingColumn { entity: String, column: String },

    /// A column holds a type no cleaning rule can work with.
    #[error("Column '{column}' has type {found}, expected {expected}")]
    UnexpectedColumnType {
        column: String,
        expected: String,
        found: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No raw table is available for an entity.
    #[error("No raw table found for '{0}'")]
    SourceNotFound(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a missing column on a given entity.
    pub fn missing_column(entity: impl Into<String>, column: impl Into<String>) -> Self {
        CleaningError::MissingColumn {
            entity: entity.into(),
            column: column.into(),
        }
    }

    /// Get a stable error code for callers that branch on the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::UnexpectedColumnType { .. } => "UNEXPECTED_COLUMN_TYPE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a violation of a pipeline's input contract.
    ///
    /// Structural errors mean the raw table does not have the shape the
    /// pipeline is hard-coded for; retrying with the same input cannot help.
    pub fn is_structural(&self) -> bool {
        match self {
            Self::MissingColumn { .. } | Self::UnexpectedColumnType { .. } => true,
            Self::WithContext { source, .. } => source.is_structural(),
            _ => false,
        }
    }
}

impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
