//! Name-indexed store collection.

use crate::error::{MarketError, Result};
use crate::model::Store;
use std::collections::BTreeMap;

/// Stores keyed by name, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    stores: BTreeMap<String, Store>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a store under its trimmed name; names are unique.
    pub fn add(&mut self, mut store: Store) -> Result<()> {
        trim_name(&mut store);
        if self.stores.contains_key(&store.name) {
            return Err(MarketError::StoreExists(store.name));
        }
        self.stores.insert(store.name.clone(), store);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Store> {
        self.stores
            .remove(name.trim())
            .ok_or_else(|| MarketError::StoreNotFound(name.trim().to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Store> {
        self.stores.get(name.trim())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Store> {
        self.stores.get_mut(name.trim())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores.contains_key(name.trim())
    }

    /// Sorted store names.
    pub fn names(&self) -> Vec<&str> {
        self.stores.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Store> {
        self.stores.values()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Closest known store name for a misspelt lookup.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        foodshare_search::closest_match(name, self.stores.keys().map(String::as_str))
    }

    /// Error for a missing store, carrying a suggestion in its message when one exists.
    pub fn not_found(&self, name: &str) -> String {
        let base = MarketError::StoreNotFound(name.trim().to_string()).to_string();
        match self.suggest(name) {
            Some(candidate) => format!("{base} Did you mean {candidate}?"),
            None => base,
        }
    }
}

impl FromIterator<Store> for StoreRegistry {
    /// Later duplicates replace earlier ones.
    fn from_iter<I: IntoIterator<Item = Store>>(iter: I) -> Self {
        Self {
            stores: iter
                .into_iter()
                .map(|mut s| {
                    trim_name(&mut s);
                    (s.name.clone(), s)
                })
                .collect(),
        }
    }
}

fn trim_name(store: &mut Store) {
    let trimmed = store.name.trim();
    if trimmed.len() != store.name.len() {
        store.name = trimmed.to_string();
    }
}
