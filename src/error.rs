//! Extraction error taxonomy
//!
//! Only conditions that make the IR itself unreliable are errors: unreadable
//! configuration, unparseable input, unwritable output. Every other anomaly
//! (unresolved imports, unresolved context references) degrades to a report
//! finding and extraction continues.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// No resolvable project configuration; aborts before any extraction
    #[error("no resolvable project configuration: {0}")]
    Config(String),

    /// A source file could not be parsed into a syntax tree
    #[error("failed to parse {file}")]
    Parse { file: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
