//! Terminal helpers for Foodshare market consoles
//!
//! Provides shared CLI functionality:
//! - Status messages and key/value rows
//! - Pretty printing of JSON-bearing results
//! - Spinners while waiting on the cluster

#![warn(missing_docs)]

pub mod output;
pub mod progress;
