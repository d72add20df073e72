//! Error types for weight frame parsing

use thiserror::Error;

/// Errors that can occur while interpreting a weight frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No known frame layout matched the payload
    #[error("unrecognized weight frame: {0:?}")]
    Unrecognized(String),

    /// A layout matched but the captured text is not a usable number
    #[error("invalid weight value: {0}")]
    InvalidNumber(String),
}
