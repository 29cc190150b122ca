use std::fmt;

use crate::mapping::Field;
use crate::model::Dataset;

/// Fatal errors. Any of these aborts the run.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (unknown field in an alias table, bad tolerance, etc.).
    ConfigValidation(String),
    /// Input could not be decoded or split into columns.
    Ingest { dataset: Dataset, reason: String },
    /// No header in the dataset matches any spelling of a required field.
    MissingColumn { dataset: Dataset, field: Field, tried: Vec<String> },
    /// IO error (file read, output write, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Ingest { dataset, reason } => write!(f, "{dataset}: cannot ingest file: {reason}"),
            Self::MissingColumn { dataset, field, tried } => {
                write!(f, "{dataset}: missing column for field {field} (tried: {})", tried.join(", "))
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

/// Per-cell normalization failure. Never fatal: the cell is kept as an
/// unparseable value and reported as a mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    NumberParse { raw: String },
    DateParse { raw: String },
}

impl CellError {
    pub fn raw(&self) -> &str {
        match self {
            Self::NumberParse { raw } | Self::DateParse { raw } => raw,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NumberParse { raw } => write!(f, "cannot parse number '{raw}'"),
            Self::DateParse { raw } => write!(f, "cannot parse date '{raw}'"),
        }
    }
}

impl std::error::Error for CellError {}
