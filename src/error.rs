//! Error types for IFC Checker.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing IFC files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the IFC file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The model was not loaded from text, so there is nothing to patch.
    #[error("no original IFC text available for export")]
    NoOriginalText,

    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}

/// Errors raised while converting an IDS document.
#[derive(Debug, Error)]
pub enum IdsError {
    #[error("failed to read IDS file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("invalid IDS XML: {message}")]
    InvalidXml { message: String },

    /// The document parsed but declares no `<specification>`.
    #[error("IDS document contains no specifications")]
    NoSpecifications,
}

/// Errors raised while loading a rule pack.
#[derive(Debug, Error)]
pub enum RulePackError {
    #[error("failed to read rule pack '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid rule pack JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Errors raised when editing property values.
#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("element #{0} not found")]
    ElementNotFound(u64),

    #[error("element #{element} has no property set '{pset}'")]
    PropertySetNotFound { element: u64, pset: String },

    #[error("property '{pset}.{property}' not found on element #{element}")]
    PropertyNotFound {
        element: u64,
        pset: String,
        property: String,
    },

    /// Only `Pset_*Common` sets are editable.
    #[error("property set '{pset}' is read-only")]
    ReadOnlyPropertySet { pset: String },
}

/// Terminal failures of a background validation task.
#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    /// The task was torn down before it produced a result.
    #[error("validation aborted")]
    Aborted,

    /// The worker hit an unexpected failure.
    #[error("validation worker failed: {message}")]
    WorkerFailed { message: String },

    /// The worker went away without a terminal event.
    #[error("validation worker disconnected")]
    Disconnected,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}
