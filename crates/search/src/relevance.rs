//! How well a store or product name answers a query.

/// Match quality, best last so the derived ordering ranks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelevanceScore {
    None = 0,
    /// Query chars appear in order
    Fuzzy = 10,
    Contains = 20,
    /// Query starts one of the name's words, e.g. "Corner" in "CoffeeCorner"
    WordBoundary = 30,
    StartsWith = 40,
    /// Equal ignoring case
    Exact = 50,
}

/// Scores `name` against `query`, ignoring case.
pub fn calculate_relevance(name: &str, query: &str) -> u32 {
    let name_lower = name.to_lowercase();
    let query_lower = query.to_lowercase();

    let score = if name_lower == query_lower {
        RelevanceScore::Exact
    } else if name_lower.starts_with(&query_lower) {
        RelevanceScore::StartsWith
    } else if words(name).any(|word| word.to_lowercase().starts_with(&query_lower)) {
        RelevanceScore::WordBoundary
    } else if name_lower.contains(&query_lower) {
        RelevanceScore::Contains
    } else if crate::fuzzy_match(&name_lower, &query_lower) {
        RelevanceScore::Fuzzy
    } else {
        RelevanceScore::None
    };
    score as u32
}

/// Splits on whitespace and on lower-to-upper case changes.
fn words(name: &str) -> impl Iterator<Item = &str> {
    name.split_whitespace().flat_map(|chunk| {
        let mut parts = Vec::new();
        let mut start = 0;
        let mut prev_lower = false;
        for (i, c) in chunk.char_indices() {
            if c.is_uppercase() && prev_lower {
                parts.push(&chunk[start..i]);
                start = i;
            }
            prev_lower = c.is_lowercase();
        }
        parts.push(&chunk[start..]);
        parts
    })
}
