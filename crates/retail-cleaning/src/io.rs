//! Where raw tables come from and where cleaned tables go.
//!
//! Databases, PDF scraping, the store API and object storage all live outside
//! this crate. They meet the cleaning core through two traits:
//! [`TableSource`] hands over a raw table by name and [`TableSink`] accepts a
//! cleaned table under its warehouse name. CSV directories and an in-memory
//! store are provided here.

use crate::error::{CleaningError, Result, ResultExt};
use crate::types::CleaningSummary;
use chrono::Local;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// File name of the run summary written next to the cleaned tables.
pub const SUMMARY_FILE_NAME: &str = "cleaning_summary.json";

/// Supplies raw tables by source name.
pub trait TableSource {
    fn read_table(&self, name: &str) -> Result<DataFrame>;
}

/// Accepts cleaned tables under their warehouse table name.
pub trait TableSink {
    fn write_table(&self, name: &str, df: &mut DataFrame) -> Result<()>;
}

// ============================================================================
// CSV directories
// ============================================================================

/// Reads `<dir>/<name>.csv`.
///
/// Every column is read as text and empty fields stay empty strings, so no
/// value is reinterpreted before a cleaning rule sees it.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    dir: PathBuf,
}

impl CsvTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl TableSource for CsvTableSource {
    fn read_table(&self, name: &str) -> Result<DataFrame> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(CleaningError::SourceNotFound(path.display().to_string()));
        }

        debug!("Reading {}", path.display());
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(CsvParseOptions::default().with_missing_is_null(false))
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()
            .context(format!("Failed to read {}", path.display()))?;

        let renames: Vec<(String, String)> = df
            .get_column_names()
            .iter()
            .enumerate()
            .filter_map(|(position, name)| {
                unnamed_header(name.as_str(), position).map(|new| (name.to_string(), new))
            })
            .collect();
        for (old, new) in renames {
            df.rename(&old, new.into())?;
        }

        Ok(df)
    }
}

/// Name for a header cell left blank by the exporting tool.
///
/// Blank headers arrive either empty or as the reader's `column_<n>`
/// placeholder; both become `Unnamed: <position>`.
fn unnamed_header(name: &str, position: usize) -> Option<String> {
    let placeholder = format!("column_{}", position + 1);
    (name.is_empty() || name == placeholder).then(|| format!("Unnamed: {}", position))
}

/// Writes `<dir>/<name>.csv`, creating the directory when needed.
#[derive(Debug, Clone)]
pub struct CsvTableSink {
    dir: PathBuf,
}

impl CsvTableSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl TableSink for CsvTableSink {
    fn write_table(&self, name: &str, df: &mut DataFrame) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        let mut file = File::create(&path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)
            .context(format!("Failed to write {}", path.display()))?;

        info!("Table saved: {}", path.display());
        Ok(())
    }
}

// ============================================================================
// In-memory tables
// ============================================================================

/// A named set of tables held in memory; both a source and a sink.
#[derive(Debug, Default)]
pub struct MemoryTables {
    tables: Mutex<HashMap<String, DataFrame>>,
}

impl MemoryTables {
    pub fn insert(&self, name: impl Into<String>, df: DataFrame) {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), df);
    }

    pub fn get(&self, name: &str) -> Option<DataFrame> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Names of the tables held, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl TableSource for MemoryTables {
    fn read_table(&self, name: &str) -> Result<DataFrame> {
        self.get(name)
            .ok_or_else(|| CleaningError::SourceNotFound(name.to_string()))
    }
}

impl TableSink for MemoryTables {
    fn write_table(&self, name: &str, df: &mut DataFrame) -> Result<()> {
        self.insert(name, df.clone());
        Ok(())
    }
}

// ============================================================================
// Run summary
// ============================================================================

#[derive(Serialize)]
struct SummaryReport<'a> {
    generated_at: String,
    entities: &'a [CleaningSummary],
}

/// Write the summaries of a run as pretty JSON to `<dir>/cleaning_summary.json`.
pub fn write_summary_report(dir: &Path, summaries: &[CleaningSummary]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let report = SummaryReport {
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        entities: summaries,
    };

    let report_path = dir.join(SUMMARY_FILE_NAME);
    let mut file = File::create(&report_path)?;
    file.write_all(serde_json::to_string_pretty(&report)?.as_bytes())?;

    info!("Summary saved: {}", report_path.display());
    Ok(report_path)
}
