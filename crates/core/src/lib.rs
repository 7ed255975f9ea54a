//! Core utilities for the Foodshare market cluster
//!
//! This crate provides shared functionality used by every node and console:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with per-role sections
//! - **Retry**: async retries with exponential backoff
//!
//! # Example
//!
//! ```rust,no_run
//! use foodshare_core::config::Config;
//!
//! let config = Config::load(None).expect("valid configuration");
//! println!("master listens on {}", config.schema.master.bind);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{retry, RetryConfig};
}
