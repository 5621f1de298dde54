//! Parser error types for diagnostic input

use thiserror::Error;

/// Errors that can occur while parsing an execution plan document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to decode execution plan bytes: {0}")]
    Decode(String),

    #[error("Malformed execution plan XML at line {line}, column {column}: {message}")]
    MalformedXml { line: u32, column: u32, message: String },

    #[error("No execution plan operators found in the document")]
    NoOperators,
}

/// Result type alias for parser operations
pub type ParseResult<T> = Result<T, ParseError>;
