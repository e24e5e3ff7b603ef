//! Configuration for the cleaning pipelines.
//!
//! Every entity rule is hard-coded to one raw schema; the knobs here are the
//! handful of literals those rules depend on (null tokens, the user row
//! denylist, the currency marker, rounding precision, output location).
//! Use [`CleaningConfig::builder()`] for a validated configuration.

use crate::error::{CleaningError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tokens the raw sources use to spell "no value".
pub const DEFAULT_NULL_TOKENS: [&str; 3] = ["NULL", "N/A", "None"];

/// Raw positions of legacy user rows known to hold scrambled records.
pub const DEFAULT_USER_ROW_DENYLIST: [usize; 15] = [
    752, 1046, 2995, 3536, 5306, 6420, 8386, 9013, 10211, 10360, 11366, 12177, 13111, 14101,
    14499,
];

/// Largest rounding precision accepted for coordinates and weights.
const MAX_DECIMALS: u32 = 10;

/// Configuration for the cleaning pipelines.
///
/// # Example
///
/// ```rust,ignore
/// use retail_cleaning::config::CleaningConfig;
///
/// let config = CleaningConfig::builder()
///     .coordinate_decimals(4)
///     .save_to_disk(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleaningConfig {
    /// Exact cell values replaced with null before any other rule runs.
    /// Default: `["NULL", "N/A", "None"]`
    pub null_tokens: Vec<String>,

    /// Raw row positions dropped from the user table after incomplete rows
    /// are removed. Positions that were already dropped are ignored.
    pub user_row_denylist: Vec<usize>,

    /// Marker a well-formed product price must contain.
    /// Default: "£"
    pub currency_marker: String,

    /// Exact `chrono` format of `date_payment_confirmed` in card data.
    /// Default: "%Y-%m-%d"
    pub card_date_format: String,

    /// Decimal places kept for store longitude/latitude.
    /// Default: 5
    pub coordinate_decimals: u32,

    /// Decimal places kept for product weights in kilograms.
    /// Default: 3
    pub weight_decimals: u32,

    /// Directory cleaned tables are written to.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Whether cleaned tables are written to disk.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
            user_row_denylist: DEFAULT_USER_ROW_DENYLIST.to_vec(),
            currency_marker: "£".to_string(),
            card_date_format: "%Y-%m-%d".to_string(),
            coordinate_decimals: 5,
            weight_decimals: 3,
            output_dir: PathBuf::from("output"),
            save_to_disk: true,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: CleaningConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.null_tokens.is_empty() {
            return Err(ConfigValidationError::NoNullTokens);
        }

        // An empty token would turn every blank field into a missing value.
        if self.null_tokens.iter().any(|t| t.is_empty()) {
            return Err(ConfigValidationError::EmptyNullToken);
        }

        if self.currency_marker.is_empty() {
            return Err(ConfigValidationError::EmptyField("currency_marker".to_string()));
        }

        if self.card_date_format.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("card_date_format".to_string()));
        }

        if self.coordinate_decimals > MAX_DECIMALS {
            return Err(ConfigValidationError::InvalidPrecision {
                field: "coordinate_decimals".to_string(),
                value: self.coordinate_decimals,
            });
        }

        if self.weight_decimals > MAX_DECIMALS {
            return Err(ConfigValidationError::InvalidPrecision {
                field: "weight_decimals".to_string(),
                value: self.weight_decimals,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one null token is required")]
    NoNullTokens,

    #[error("Null tokens must not be empty strings")]
    EmptyNullToken,

    #[error("'{0}' must not be empty")]
    EmptyField(String),

    #[error("Invalid precision for '{field}': {value} (must be at most 10)")]
    InvalidPrecision { field: String, value: u32 },
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    null_tokens: Option<Vec<String>>,
    user_row_denylist: Option<Vec<usize>>,
    currency_marker: Option<String>,
    card_date_format: Option<String>,
    coordinate_decimals: Option<u32>,
    weight_decimals: Option<u32>,
    output_dir: Option<PathBuf>,
    save_to_disk: Option<bool>,
}

impl CleaningConfigBuilder {
    /// Replace the list of null tokens.
    pub fn null_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the user row denylist.
    pub fn user_row_denylist(mut self, rows: impl Into<Vec<usize>>) -> Self {
        self.user_row_denylist = Some(rows.into());
        self
    }

    /// Set the currency marker product prices must contain.
    pub fn currency_marker(mut self, marker: impl Into<String>) -> Self {
        self.currency_marker = Some(marker.into());
        self
    }

    /// Set the exact date format of card payment confirmations.
    pub fn card_date_format(mut self, format: impl Into<String>) -> Self {
        self.card_date_format = Some(format.into());
        self
    }

    /// Set the decimal places kept for store coordinates.
    pub fn coordinate_decimals(mut self, decimals: u32) -> Self {
        self.coordinate_decimals = Some(decimals);
        self
    }

    /// Set the decimal places kept for product weights.
    pub fn weight_decimals(mut self, decimals: u32) -> Self {
        self.weight_decimals = Some(decimals);
        self
    }

    /// Set the output directory for cleaned tables.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable writing cleaned tables to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let config = CleaningConfig {
            null_tokens: self.null_tokens.unwrap_or(defaults.null_tokens),
            user_row_denylist: self.user_row_denylist.unwrap_or(defaults.user_row_denylist),
            currency_marker: self.currency_marker.unwrap_or(defaults.currency_marker),
            card_date_format: self.card_date_format.unwrap_or(defaults.card_date_format),
            coordinate_decimals: self.coordinate_decimals.unwrap_or(defaults.coordinate_decimals),
            weight_decimals: self.weight_decimals.unwrap_or(defaults.weight_decimals),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
        };

        config.validate()?;
        Ok(config)
    }
}
