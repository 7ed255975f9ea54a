//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    /// Latitude or longitude out of range
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A component could not be parsed as a number
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    /// Radius must be finite and non-negative
    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),
}

/// Error code for integration with foodshare-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Latitude or longitude out of range
    InvalidCoordinate = 10001,
    /// Unparseable number
    InvalidNumber = 10002,
    /// Negative or non-finite radius
    InvalidRadius = 10003,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidCoordinate(_) => GeoErrorCode::InvalidCoordinate,
            GeoError::InvalidNumber(_) => GeoErrorCode::InvalidNumber,
            GeoError::InvalidRadius(_) => GeoErrorCode::InvalidRadius,
        }
    }
}
