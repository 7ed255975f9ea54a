//! Mappers for catalogue queries.

use crate::error::{MapReduceError, Result};
use crate::job::Mapper;
use crate::pair::Pair;
use foodshare_geo::{parse_number, within_radius, Coordinate};
use foodshare_market::Store;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key used for store listings.
pub const LIST_STORES_KEY: &str = "LIST_STORES";
/// Key used for deleted product reports.
pub const DELETED_PRODUCTS_KEY: &str = "DELETED_PRODUCTS";

/// Customer search criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum SearchFilter {
    /// Category name, compared case-insensitively
    FoodCategory { category: String },
    /// Stores rated at least `min` stars
    Stars { min: u32 },
    /// Price tier level, 1 to 3
    PriceTier { level: u8 },
    /// Stores within `km` of `center`
    Radius { km: f64, center: Coordinate },
}

impl SearchFilter {
    /// Parses `Name=value` as typed in the consoles.
    ///
    /// `Radius` takes `km,longitude,latitude`; `AvgPrice` takes a count or the
    /// `$` symbols themselves.
    pub fn parse_legacy(input: &str) -> Result<Self> {
        let (name, value) = input
            .split_once('=')
            .ok_or_else(|| MapReduceError::Malformed(input.to_string()))?;
        let value = value.trim();

        match name.trim().to_ascii_lowercase().as_str() {
            "foodcategory" => {
                if value.is_empty() {
                    return Err(MapReduceError::InvalidFilter {
                        filter: "FoodCategory",
                        reason: "category is empty".to_string(),
                    });
                }
                Ok(SearchFilter::FoodCategory {
                    category: value.to_string(),
                })
            }
            "stars" => {
                let min = value.parse::<u32>().map_err(|_| MapReduceError::InvalidFilter {
                    filter: "Stars",
                    reason: format!("'{value}' is not a whole number"),
                })?;
                Ok(SearchFilter::Stars { min })
            }
            "avgprice" => {
                let level = if !value.is_empty() && value.chars().all(|c| c == '$') {
                    Some(value.len())
                } else {
                    value.parse::<usize>().ok()
                };
                match level {
                    Some(level @ 1..=3) => Ok(SearchFilter::PriceTier { level: level as u8 }),
                    _ => Err(MapReduceError::InvalidFilter {
                        filter: "AvgPrice",
                        reason: format!("'{value}' is not one of $, $$, $$$"),
                    }),
                }
            }
            "radius" => {
                let invalid = |reason: String| MapReduceError::InvalidFilter {
                    filter: "Radius",
                    reason,
                };
                let (km, center) = value
                    .split_once(',')
                    .ok_or_else(|| invalid("expected km,longitude,latitude".to_string()))?;
                let km = parse_number(km).map_err(|e| invalid(e.to_string()))?;
                if km < 0.0 {
                    return Err(invalid("radius is negative".to_string()));
                }
                let center = Coordinate::parse_lon_lat(center).map_err(|e| invalid(e.to_string()))?;
                Ok(SearchFilter::Radius { km, center })
            }
            other => Err(MapReduceError::UnknownFilter(other.to_string())),
        }
    }

    pub fn matches(&self, store: &Store) -> bool {
        match self {
            SearchFilter::FoodCategory { category } => {
                store.food_category.trim().eq_ignore_ascii_case(category.trim())
            }
            SearchFilter::Stars { min } => store.stars >= *min,
            SearchFilter::PriceTier { level } => {
                *level > 0 && store.price_tier().level() == *level
            }
            SearchFilter::Radius { km, center } => {
                within_radius(center, &store.coordinate(), *km).unwrap_or(false)
            }
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchFilter::FoodCategory { category } => write!(f, "FoodCategory={category}"),
            SearchFilter::Stars { min } => write!(f, "Stars={min}"),
            SearchFilter::PriceTier { level } => {
                write!(f, "AvgPrice={}", "$".repeat(usize::from(*level)))
            }
            SearchFilter::Radius { km, center } => {
                write!(f, "Radius={},{},{}", km, center.longitude, center.latitude)
            }
        }
    }
}

/// Emits `(store name, store JSON)` for every store matching the filter.
#[derive(Debug, Clone)]
pub struct SearchMapper {
    filter: SearchFilter,
}

impl SearchMapper {
    pub fn new(filter: SearchFilter) -> Self {
        Self { filter }
    }
}

impl Mapper<String, Store> for SearchMapper {
    fn map(&self, name: &String, store: &Store) -> Vec<Pair> {
        if !self.filter.matches(store) {
            return Vec::new();
        }
        match store.to_json() {
            Ok(json) => vec![Pair::new(name.as_str(), json)],
            Err(e) => {
                tracing::warn!(store = %name, error = %e, "Failed to encode store");
                Vec::new()
            }
        }
    }
}

/// Emits `(store name, units sold)` for one product, including zero sales.
#[derive(Debug, Clone)]
pub struct SalesMapper {
    product: String,
}

impl SalesMapper {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
        }
    }
}

impl Mapper<String, Store> for SalesMapper {
    fn map(&self, name: &String, store: &Store) -> Vec<Pair> {
        vec![Pair::new(
            name.as_str(),
            store.sales_for(&self.product).to_string(),
        )]
    }
}

/// Emits `("LIST_STORES", store name)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListStoresMapper;

impl Mapper<String, Store> for ListStoresMapper {
    fn map(&self, name: &String, _store: &Store) -> Vec<Pair> {
        vec![Pair::new(LIST_STORES_KEY, name.as_str())]
    }
}

/// One `("DELETED_PRODUCTS", name)` pair per deletion.
pub fn deleted_product_pairs(deleted: &[String]) -> Vec<Pair> {
    deleted
        .iter()
        .map(|name| Pair::new(DELETED_PRODUCTS_KEY, name.as_str()))
        .collect()
}
