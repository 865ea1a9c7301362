//! Error types for the data-loader crate.
//!
//! Covers loading the reference dataset, validating importance weights and
//! looking up feature statistics by name.

use thiserror::Error;

/// Errors that can occur while loading reference data or querying it
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// The header row lacks a feature column
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// The dataset has a header but no rows
    #[error("No records found in {file}")]
    EmptyDataset { file: String },

    /// A feature name does not belong to the pinned feature set.
    ///
    /// Only reachable through by-name lookups; typed lookups go through
    /// `Feature` and cannot fail.
    #[error("Unknown feature: {name}")]
    UnknownFeature { name: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
