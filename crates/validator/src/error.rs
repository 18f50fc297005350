use std::fmt;

use crate::model::CheckStatus;

/// Failures of the validator API surface. Checklist outcomes are never
/// reported through this type.
#[derive(Debug)]
pub enum ValidatorError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (inverted band, empty token list, etc.).
    ConfigValidation(String),
    /// Generation requested after a run whose overall status blocks it.
    GenerationBlocked { status: CheckStatus },
    /// Generation requested before any validation of the current inputs.
    NotValidated,
    /// Editable field or template problem.
    Template(String),
}

impl fmt::Display for ValidatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::GenerationBlocked { status } => {
                write!(f, "generation blocked: last validation finished with {status}")
            }
            Self::NotValidated => write!(f, "no validation result for the current inputs"),
            Self::Template(msg) => write!(f, "template error: {msg}"),
        }
    }
}

impl std::error::Error for ValidatorError {}

/// Structural failure of a sheet parser. The engine turns these into
/// checklist rows; they never cross the engine boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// No row within the scan window carried every required token.
    HeaderNotFound { sheet: String, expected: Vec<String> },
    /// The input could not be decoded as a workbook.
    Decode { input: String, message: String },
    /// The workbook decoded but has no sheet to read.
    EmptyWorkbook { input: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderNotFound { sheet, expected } => {
                write!(f, "sheet '{sheet}': no header with {}", expected.join(" + "))
            }
            Self::Decode { input, message } => write!(f, "cannot read '{input}': {message}"),
            Self::EmptyWorkbook { input } => write!(f, "'{input}' has no sheets"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Failure reported by a [`crate::reader::WorkbookReader`] backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    /// The backend cannot perform this operation at all.
    Unsupported(String),
    /// The bytes are not a readable workbook / archive.
    Decode(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ReadError {}
