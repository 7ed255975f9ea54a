//! Configuration loading and schema definitions
//!
//! Shared configuration types used by every cluster role.

mod loader;
mod schema;

pub use loader::{Config, CONFIG_FILE_NAME};
pub use schema::*;
