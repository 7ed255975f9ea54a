//! Product shelf operations with a deletion log.
//!
//! Every operation returns the message shown to the store manager.

use crate::model::{Product, Store};

/// Applies manager product commands and remembers which products were deleted.
#[derive(Debug, Clone, Default)]
pub struct ProductLedger {
    deleted: Vec<String>,
}

impl ProductLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&mut self, store: &mut Store, product: Product) -> String {
        let name = product.name.clone();
        match store.add_product(product) {
            Ok(()) => format!("Product {} added to store {}.", name, store.name),
            Err(e) => e.to_string(),
        }
    }

    pub fn remove_product(&mut self, store: &mut Store, product: &str) -> String {
        let product = product.trim();
        if store.remove_product(product) {
            self.deleted.push(product.to_string());
            format!("Product {} removed from store {}.", product, store.name)
        } else {
            not_found(store, product)
        }
    }

    pub fn update_amount(&mut self, store: &mut Store, product: &str, amount: u32) -> String {
        let product = product.trim();
        match store.product_mut(product) {
            Some(p) => {
                p.available_amount = amount;
                format!(
                    "Product {} amount updated to {} in store {}.",
                    product, amount, store.name
                )
            }
            None => not_found(store, product),
        }
    }

    pub fn increment_amount(&mut self, store: &mut Store, product: &str, increment: u32) -> String {
        let product = product.trim();
        match store.product_mut(product) {
            Some(p) => {
                p.available_amount = p.available_amount.saturating_add(increment);
                let amount = p.available_amount;
                format!(
                    "Product {} amount increased by {} in store {}. New amount: {}.",
                    product, increment, store.name, amount
                )
            }
            None => not_found(store, product),
        }
    }

    /// Refuses to take more units than are on the shelf.
    pub fn decrement_amount(&mut self, store: &mut Store, product: &str, decrement: u32) -> String {
        let product = product.trim();
        match store.product_mut(product) {
            Some(p) if decrement > p.available_amount => format!(
                "You cannot remove {} units; only {} available.",
                decrement, p.available_amount
            ),
            Some(p) => {
                p.available_amount -= decrement;
                let amount = p.available_amount;
                format!(
                    "Product {} amount decreased by {} in store {}. New amount: {}.",
                    product, decrement, store.name, amount
                )
            }
            None => not_found(store, product),
        }
    }

    /// Deleted product names, oldest first.
    pub fn deleted(&self) -> &[String] {
        &self.deleted
    }

    pub fn report(&self) -> String {
        if self.deleted.is_empty() {
            "No products have been deleted.".to_string()
        } else {
            format!("DELETED PRODUCTS: {}", self.deleted.join(", "))
        }
    }
}

fn not_found(store: &Store, product: &str) -> String {
    format!("Product {} not found in store {}.", product, store.name)
}
