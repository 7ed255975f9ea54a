//! Error types for the mapreduce crate.

use foodshare_core::{Error, ErrorCode};
use thiserror::Error;

/// Result type alias for mapreduce operations.
pub type Result<T> = std::result::Result<T, MapReduceError>;

/// Errors raised while building queries.
#[derive(Debug, Error, PartialEq)]
pub enum MapReduceError {
    /// Filter name is not one of the supported search filters
    #[error("Unknown search filter '{0}'")]
    UnknownFilter(String),

    /// Filter value could not be parsed
    #[error("Invalid value for {filter}: {reason}")]
    InvalidFilter { filter: &'static str, reason: String },

    /// Filter text is missing the `Name=value` separator
    #[error("Malformed filter '{0}', expected Name=value")]
    Malformed(String),
}

impl MapReduceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MapReduceError::UnknownFilter(_) => ErrorCode::UnknownCommand,
            MapReduceError::InvalidFilter { .. } => ErrorCode::InvalidInput,
            MapReduceError::Malformed(_) => ErrorCode::InvalidFormat,
        }
    }
}

impl From<MapReduceError> for Error {
    fn from(err: MapReduceError) -> Self {
        Error::new(err.code(), err.to_string())
            .with_suggestion("Use FoodCategory=<name>, Stars=<1-5>, AvgPrice=<$|$$|$$$> or Radius=<km>,<lon>,<lat>")
    }
}
