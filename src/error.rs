// ==============================================================================
// error.rs - Conversion Error Taxonomy
// ==============================================================================
// Description: Fatal error kinds for LD table to ldmat container conversion
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 0.1.0
// ==============================================================================

use std::path::PathBuf;
use thiserror::Error;

use crate::parsers::{FrqParseError, LdParseError};

/// Errors that abort a conversion (or a container read)
///
/// Every variant is fatal: there is no partial-result mode.
#[derive(Error, Debug)]
pub enum LdmatError {
    #[error(
        "Malformed input in {path:?}{}: {details}",
        .line.map(|l| format!(" at line {}", l)).unwrap_or_default()
    )]
    MalformedInput {
        path: PathBuf,
        /// 1-based line number, when the problem is tied to one row
        line: Option<usize>,
        details: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No LD pairs to convert in {path:?}")]
    EmptyInput { path: PathBuf },

    #[error("IO error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "LD matrix for {markers} markers needs {bytes} bytes (limit: {limit} bytes)"
    )]
    Allocation { markers: usize, bytes: u64, limit: u64 },

    #[error("HDF5 error while {context}: {source}")]
    Hdf5 {
        context: String,
        #[source]
        source: hdf5::Error,
    },

    #[error("Invalid ldmat container: {0}")]
    InvalidContainer(String),
}

pub type LdmatResult<T> = Result<T, LdmatError>;

impl LdmatError {
    /// Wrap an IO error with a description of the step that failed
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        LdmatError::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap an HDF5 library error raised while writing a container
    pub fn hdf5(context: impl Into<String>, source: hdf5::Error) -> Self {
        LdmatError::Hdf5 {
            context: context.into(),
            source,
        }
    }
}

impl From<LdParseError> for LdmatError {
    fn from(err: LdParseError) -> Self {
        match err {
            LdParseError::IoError { path, source } => {
                LdmatError::io(format!("reading {:?}", path), source)
            }
            LdParseError::MissingColumn { path, column } => LdmatError::MalformedInput {
                path,
                line: Some(1),
                details: format!("required column '{}' not found in header", column),
            },
            LdParseError::InvalidRow {
                path,
                line,
                details,
            } => LdmatError::MalformedInput {
                path,
                line: Some(line),
                details,
            },
            LdParseError::EmptyFile { path } => LdmatError::MalformedInput {
                path,
                line: None,
                details: "no header row; required columns are absent".to_string(),
            },
        }
    }
}

impl From<FrqParseError> for LdmatError {
    fn from(err: FrqParseError) -> Self {
        match err {
            FrqParseError::IoError { path, source } => {
                LdmatError::io(format!("reading {:?}", path), source)
            }
            FrqParseError::MissingColumn { path, column } => LdmatError::MalformedInput {
                path,
                line: Some(1),
                details: format!("required column '{}' not found in header", column),
            },
            FrqParseError::InvalidRow {
                path,
                line,
                details,
            } => LdmatError::MalformedInput {
                path,
                line: Some(line),
                details,
            },
        }
    }
}
