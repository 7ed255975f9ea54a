//! Error types for the market crate.

use foodshare_core::{Error, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for market operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors raised by store and catalogue operations.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Store already exists.")]
    StoreExists(String),

    #[error("Store {0} not found.")]
    StoreNotFound(String),

    #[error("Product {product} not found in store {store}.")]
    ProductNotFound { store: String, product: String },

    #[error("Product {product} already exists in store {store}.")]
    ProductExists { store: String, product: String },

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Review must be between 1 and 5 stars, got {0}")]
    InvalidReview(u32),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid store file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl MarketError {
    /// Maps onto the shared error code space (8xxx catalogue, 6xxx validation).
    pub fn code(&self) -> ErrorCode {
        match self {
            MarketError::StoreExists(_) => ErrorCode::StoreExists,
            MarketError::StoreNotFound(_) => ErrorCode::StoreNotFound,
            MarketError::ProductNotFound { .. } => ErrorCode::ProductNotFound,
            MarketError::ProductExists { .. } => ErrorCode::ConstraintViolation,
            MarketError::InsufficientStock { .. } => ErrorCode::ConstraintViolation,
            MarketError::InvalidQuantity | MarketError::InvalidReview(_) => ErrorCode::InvalidInput,
            MarketError::Read { .. } => ErrorCode::IoError,
            MarketError::Parse { .. } => ErrorCode::InvalidFormat,
        }
    }
}

impl From<MarketError> for Error {
    fn from(err: MarketError) -> Self {
        let code = err.code();
        let message = err.to_string();
        Error::new(code, message).with_source(err)
    }
}
