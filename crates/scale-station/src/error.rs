//! Error types for the station facade

use thiserror::Error;

/// Errors surfaced by station operations
///
/// Read failures are not errors here: they come back inside a
/// [`WeightReadResult`](scale_protocol::WeightReadResult).
#[derive(Debug, Error)]
pub enum StationError {
    /// No scale is registered under this id
    #[error("scale not found: {0}")]
    ScaleNotFound(String),

    /// The registry could not be read or updated
    #[error("registry error: {0}")]
    Registry(String),
}
