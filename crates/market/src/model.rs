//! Stores, products and price tiers.

use crate::error::{MarketError, Result};
use foodshare_geo::Coordinate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Average price below which a store is in the cheapest tier.
pub const LOW_PRICE_LIMIT: f64 = 5.0;
/// Average price below which a store is in the middle tier.
pub const MEDIUM_PRICE_LIMIT: f64 = 15.0;
/// Symbol shown for a store with no products.
pub const UNPRICED_SYMBOL: &str = "Not any products in the store";

/// A product on a store's shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "ProductName")]
    pub name: String,

    #[serde(rename = "ProductType", default)]
    pub product_type: String,

    #[serde(rename = "Available Amount", default)]
    pub available_amount: u32,

    #[serde(rename = "Price", default)]
    pub price: f64,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        product_type: impl Into<String>,
        available_amount: u32,
        price: f64,
    ) -> Self {
        Self {
            name: name.into(),
            product_type: product_type.into(),
            available_amount,
            price,
        }
    }

    /// Name comparison ignores surrounding whitespace.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim() == name.trim()
    }
}

/// Price tier derived from a store's average product price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceTier {
    Unpriced,
    Low,
    Medium,
    High,
}

impl PriceTier {
    /// Classifies an average price.
    pub fn from_average(average: f64) -> Self {
        if average < LOW_PRICE_LIMIT {
            PriceTier::Low
        } else if average < MEDIUM_PRICE_LIMIT {
            PriceTier::Medium
        } else {
            PriceTier::High
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            PriceTier::Unpriced => UNPRICED_SYMBOL,
            PriceTier::Low => "$",
            PriceTier::Medium => "$$",
            PriceTier::High => "$$$",
        }
    }

    /// Number of `$` signs, 0 for a store without products.
    pub fn level(&self) -> u8 {
        match self {
            PriceTier::Unpriced => 0,
            PriceTier::Low => 1,
            PriceTier::Medium => 2,
            PriceTier::High => 3,
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A store and its shelf.
///
/// Deserializes from the catalogue's store files. Serialization also emits the
/// derived `AveragePriceSymbol` so clients can display the tier directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Store {
    #[serde(rename = "StoreName")]
    pub name: String,

    #[serde(rename = "Latitude", default)]
    pub latitude: f64,

    #[serde(rename = "Longitude", default)]
    pub longitude: f64,

    #[serde(rename = "FoodCategory", default)]
    pub food_category: String,

    #[serde(rename = "Stars", default)]
    pub stars: u32,

    #[serde(rename = "NoOfVotes", default)]
    pub votes: u32,

    #[serde(rename = "StoreLogo", default)]
    pub logo: String,

    #[serde(rename = "Products", default)]
    pub products: Vec<Product>,

    #[serde(rename = "TotalRevenue", default)]
    pub total_revenue: f64,

    #[serde(rename = "Sales", default)]
    pub sales: BTreeMap<String, u32>,
}

impl Serialize for Store {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Store", 11)?;
        state.serialize_field("StoreName", &self.name)?;
        state.serialize_field("Latitude", &self.latitude)?;
        state.serialize_field("Longitude", &self.longitude)?;
        state.serialize_field("FoodCategory", &self.food_category)?;
        state.serialize_field("Stars", &self.stars)?;
        state.serialize_field("NoOfVotes", &self.votes)?;
        state.serialize_field("StoreLogo", &self.logo)?;
        state.serialize_field("Products", &self.products)?;
        state.serialize_field("TotalRevenue", &self.total_revenue)?;
        state.serialize_field("Sales", &self.sales)?;
        state.serialize_field("AveragePriceSymbol", self.price_tier().symbol())?;
        state.end()
    }
}

impl Store {
    pub fn new(name: impl Into<String>, food_category: impl Into<String>, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            latitude: location.latitude,
            longitude: location.longitude,
            food_category: food_category.into(),
            stars: 0,
            votes: 0,
            logo: String::new(),
            products: Vec::new(),
            total_revenue: 0.0,
            sales: BTreeMap::new(),
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Mean product price, 0 with an empty shelf.
    pub fn average_price(&self) -> f64 {
        if self.products.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.products.iter().map(|p| p.price).sum();
        sum / self.products.len() as f64
    }

    pub fn price_tier(&self) -> PriceTier {
        if self.products.is_empty() {
            PriceTier::Unpriced
        } else {
            PriceTier::from_average(self.average_price())
        }
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.is_named(name))
    }

    pub fn product_mut(&mut self, name: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.is_named(name))
    }

    /// Adds a product; names are unique per store.
    pub fn add_product(&mut self, product: Product) -> Result<()> {
        if self.product(&product.name).is_some() {
            return Err(MarketError::ProductExists {
                store: self.name.clone(),
                product: product.name,
            });
        }
        self.products.push(product);
        Ok(())
    }

    /// Removes a product by name. Returns false when it was not on the shelf.
    pub fn remove_product(&mut self, name: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| !p.is_named(name));
        self.products.len() != before
    }

    /// Buys `quantity` units, returning the stock left.
    ///
    /// A failed purchase leaves the store untouched.
    pub fn purchase(&mut self, product_name: &str, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(MarketError::InvalidQuantity);
        }
        let store = self.name.clone();
        let product = self
            .product_mut(product_name)
            .ok_or_else(|| MarketError::ProductNotFound {
                store,
                product: product_name.trim().to_string(),
            })?;

        if product.available_amount < quantity {
            return Err(MarketError::InsufficientStock {
                product: product.name.clone(),
                requested: quantity,
                available: product.available_amount,
            });
        }

        product.available_amount -= quantity;
        let remaining = product.available_amount;
        let revenue = f64::from(quantity) * product.price;
        let key = product.name.trim().to_string();

        self.total_revenue += revenue;
        let sold = self.sales.entry(key).or_insert(0);
        *sold = sold.saturating_add(quantity);
        Ok(remaining)
    }

    /// Folds a 1 to 5 star review into the integer running mean.
    pub fn apply_review(&mut self, review: u32) -> Result<()> {
        if !(1..=5).contains(&review) {
            return Err(MarketError::InvalidReview(review));
        }
        let votes = u64::from(self.votes);
        let total = u64::from(self.stars) * votes + u64::from(review);
        // The mean of values in 1..=5 always fits in u32
        self.stars = (total / (votes + 1)) as u32;
        self.votes = self.votes.saturating_add(1);
        Ok(())
    }

    /// Units of a product sold since the store was loaded.
    pub fn sales_for(&self, product_name: &str) -> u32 {
        self.sales.get(product_name.trim()).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
