//! Store catalogue model for the Foodshare market.
//!
//! - [`Store`] and [`Product`] with the JSON layout of the store files
//! - [`PriceTier`] derived from average product price
//! - [`StoreRegistry`] for name lookups with suggestions
//! - [`ProductLedger`] for manager shelf operations
//! - [`catalogue`] for loading store files

pub mod catalogue;
mod error;
mod ledger;
mod model;
mod registry;

pub use error::{MarketError, Result};
pub use ledger::ProductLedger;
pub use model::{
    PriceTier, Product, Store, LOW_PRICE_LIMIT, MEDIUM_PRICE_LIMIT, UNPRICED_SYMBOL,
};
pub use registry::StoreRegistry;
