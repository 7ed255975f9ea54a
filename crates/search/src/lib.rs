//! Fuzzy matching for Foodshare market names.
//!
//! Used by the store registry to answer an unknown name with the closest
//! known one. Scoring ranks exact, prefix and CamelCase-word hits above plain
//! edit distance.

mod error;
mod fuzzy;
mod relevance;
mod suggest;

pub use error::{Result, SearchError};
pub use fuzzy::{fuzzy_match, levenshtein_distance};
pub use relevance::{calculate_relevance, RelevanceScore};
pub use suggest::{closest_match, rank};

/// A candidate name and its relevance to the query.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchResult<T> {
    pub item: T,
    pub score: u32,
}
