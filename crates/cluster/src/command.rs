//! Client commands and how the master routes them.

use crate::error::{ClusterError, Result};
use foodshare_mapreduce::SearchFilter;
use foodshare_market::{Product, Store};
use serde::{Deserialize, Serialize};

/// A customer or manager request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Search {
        filter: SearchFilter,
    },
    PurchaseProduct {
        store: String,
        product: String,
        quantity: u32,
    },
    Review {
        store: String,
        stars: u32,
    },
    #[serde(rename = "AGGREGATE_SALES_BY_PRODUCT_NAME")]
    AggregateSales {
        product: String,
    },
    AddStore {
        store: Store,
    },
    RemoveStore {
        store: String,
    },
    AddProduct {
        store: String,
        product: Product,
    },
    RemoveProduct {
        store: String,
        product: String,
    },
    UpdateProductAmount {
        store: String,
        product: String,
        amount: u32,
    },
    IncrementProductAmount {
        store: String,
        product: String,
        amount: u32,
    },
    DecrementProductAmount {
        store: String,
        product: String,
        amount: u32,
    },
    ListStores,
    DeletedProducts,
}

/// Where the master sends a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing<'a> {
    /// The worker owning this store, falling back to its replica
    Directed(&'a str),
    /// Every worker maps, the reducer merges
    Reduce,
    /// Every worker applies it; the master records it for late joiners
    Catalogue,
}

impl Command {
    /// Upper-snake name used in logs and the text console.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Search { .. } => "SEARCH",
            Command::PurchaseProduct { .. } => "PURCHASE_PRODUCT",
            Command::Review { .. } => "REVIEW",
            Command::AggregateSales { .. } => "AGGREGATE_SALES_BY_PRODUCT_NAME",
            Command::AddStore { .. } => "ADD_STORE",
            Command::RemoveStore { .. } => "REMOVE_STORE",
            Command::AddProduct { .. } => "ADD_PRODUCT",
            Command::RemoveProduct { .. } => "REMOVE_PRODUCT",
            Command::UpdateProductAmount { .. } => "UPDATE_PRODUCT_AMOUNT",
            Command::IncrementProductAmount { .. } => "INCREMENT_PRODUCT_AMOUNT",
            Command::DecrementProductAmount { .. } => "DECREMENT_PRODUCT_AMOUNT",
            Command::ListStores => "LIST_STORES",
            Command::DeletedProducts => "DELETED_PRODUCTS",
        }
    }

    pub fn routing(&self) -> Routing<'_> {
        match self {
            Command::PurchaseProduct { store, .. }
            | Command::Review { store, .. }
            | Command::AddProduct { store, .. }
            | Command::RemoveProduct { store, .. }
            | Command::UpdateProductAmount { store, .. }
            | Command::IncrementProductAmount { store, .. }
            | Command::DecrementProductAmount { store, .. } => Routing::Directed(store.trim()),
            Command::Search { .. }
            | Command::AggregateSales { .. }
            | Command::ListStores
            | Command::DeletedProducts => Routing::Reduce,
            Command::AddStore { .. } | Command::RemoveStore { .. } => Routing::Catalogue,
        }
    }

    /// Parses the text form typed in consoles: a command name plus a data string.
    ///
    /// Fields in the data string are separated by `|`, e.g.
    /// `PURCHASE_PRODUCT` with `PizzaWorld|pepperoni|2`.
    pub fn parse_legacy(name: &str, data: &str) -> Result<Self> {
        let name = name.trim().to_ascii_uppercase();
        let data = data.trim();
        let fields: Vec<&str> = data.split('|').map(str::trim).collect();

        let command = match name.as_str() {
            "SEARCH" => Command::Search {
                filter: SearchFilter::parse_legacy(data)?,
            },
            "PURCHASE_PRODUCT" => {
                let [store, product, quantity] = expect_fields::<3>(&name, &fields)?;
                Command::PurchaseProduct {
                    store: store.to_string(),
                    product: product.to_string(),
                    quantity: parse_count(&name, quantity)?,
                }
            }
            "REVIEW" => {
                let [store, stars] = expect_fields::<2>(&name, &fields)?;
                Command::Review {
                    store: store.to_string(),
                    stars: parse_count(&name, stars)?,
                }
            }
            "AGGREGATE_SALES_BY_PRODUCT_NAME" => {
                let product = data
                    .strip_prefix("ProductName=")
                    .unwrap_or(data)
                    .trim();
                if product.is_empty() {
                    return Err(ClusterError::invalid_data(&name, "expected ProductName=<value>"));
                }
                Command::AggregateSales {
                    product: product.to_string(),
                }
            }
            "ADD_STORE" => Command::AddStore {
                store: serde_json::from_str(data)
                    .map_err(|e| ClusterError::invalid_data(&name, e.to_string()))?,
            },
            "REMOVE_STORE" => {
                let [store] = expect_fields::<1>(&name, &fields)?;
                Command::RemoveStore {
                    store: store.to_string(),
                }
            }
            "ADD_PRODUCT" => {
                // The product JSON may itself contain '|', so split once
                let (store, product) = data
                    .split_once('|')
                    .ok_or_else(|| ClusterError::invalid_data(&name, "expected store|{product json}"))?;
                Command::AddProduct {
                    store: store.trim().to_string(),
                    product: serde_json::from_str(product.trim())
                        .map_err(|e| ClusterError::invalid_data(&name, e.to_string()))?,
                }
            }
            "REMOVE_PRODUCT" => {
                let [store, product] = expect_fields::<2>(&name, &fields)?;
                Command::RemoveProduct {
                    store: store.to_string(),
                    product: product.to_string(),
                }
            }
            "UPDATE_PRODUCT_AMOUNT" | "INCREMENT_PRODUCT_AMOUNT" | "DECREMENT_PRODUCT_AMOUNT" => {
                let [store, product, amount] = expect_fields::<3>(&name, &fields)?;
                let (store, product) = (store.to_string(), product.to_string());
                let amount = parse_count(&name, amount)?;
                match name.as_str() {
                    "UPDATE_PRODUCT_AMOUNT" => Command::UpdateProductAmount { store, product, amount },
                    "INCREMENT_PRODUCT_AMOUNT" => {
                        Command::IncrementProductAmount { store, product, amount }
                    }
                    _ => Command::DecrementProductAmount { store, product, amount },
                }
            }
            "LIST_STORES" => Command::ListStores,
            "DELETED_PRODUCTS" => Command::DeletedProducts,
            _ => return Err(ClusterError::UnknownCommand(name)),
        };
        Ok(command)
    }
}

fn expect_fields<'a, const N: usize>(command: &str, fields: &[&'a str]) -> Result<[&'a str; N]> {
    let fields: [&'a str; N] = fields.try_into().map_err(|_| {
        ClusterError::invalid_data(
            command,
            format!("expected {} '|'-separated fields, got {}", N, fields.len()),
        )
    })?;
    if fields.iter().any(|f| f.is_empty()) {
        return Err(ClusterError::invalid_data(command, "empty field"));
    }
    Ok(fields)
}

fn parse_count(command: &str, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| ClusterError::invalid_data(command, format!("'{value}' is not a whole number")))
}
