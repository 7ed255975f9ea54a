//! "Did you mean" suggestions.

use crate::{calculate_relevance, levenshtein_distance, Result, SearchError, SearchResult};

/// Ranks candidates against a query, best first.
///
/// Candidates with no relevance and an edit distance above the tolerance are
/// dropped. Ties keep the candidates' input order.
pub fn rank<'a, I>(query: &str, candidates: I) -> Result<Vec<SearchResult<&'a str>>>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::InvalidQuery("query is empty".to_string()));
    }

    let query_lower = query.to_lowercase();
    let tolerance = tolerance(&query_lower);

    let mut scored: Vec<(usize, SearchResult<&'a str>)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = levenshtein_distance(&query_lower, &candidate.to_lowercase());
            let relevance = calculate_relevance(candidate, query);
            if relevance == 0 && distance > tolerance {
                return None;
            }
            Some((
                distance,
                SearchResult {
                    item: candidate,
                    score: relevance,
                },
            ))
        })
        .collect();

    scored.sort_by(|(da, a), (db, b)| da.cmp(db).then(b.score.cmp(&a.score)));
    Ok(scored.into_iter().map(|(_, result)| result).collect())
}

/// Returns the single best suggestion for a misspelt name.
///
/// An exact match is never suggested back: the caller already failed to find
/// it, so echoing it would not help.
pub fn closest_match<'a, I>(query: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    rank(query, candidates)
        .ok()?
        .into_iter()
        .find(|result| result.item != query.trim())
        .map(|result| result.item)
}

/// Allowed edits grow with the query: one per three characters, at least two.
fn tolerance(query: &str) -> usize {
    (query.chars().count() / 3).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORES: [&str; 5] = [
        "PizzaWorld",
        "CoffeeCorner",
        "SouvlakiKing",
        "BurgerZone",
        "BakeryDelight",
    ];

    #[test]
    fn test_closest_match_typo() {
        assert_eq!(closest_match("PizaWorld", STORES), Some("PizzaWorld"));
        assert_eq!(closest_match("coffeecorner", STORES), Some("CoffeeCorner"));
    }

    #[test]
    fn test_closest_match_prefix() {
        assert_eq!(closest_match("Souvlaki", STORES), Some("SouvlakiKing"));
    }

    #[test]
    fn test_closest_match_none() {
        assert_eq!(closest_match("Sushi", STORES), None);
        assert_eq!(closest_match("", STORES), None);
    }

    #[test]
    fn test_rank_orders_by_distance() {
        let ranked = rank("BurgerZon", ["BakeryDelight", "BurgerZone", "BurgerZones"]).unwrap();
        let names: Vec<&str> = ranked.iter().map(|r| r.item).collect();
        assert_eq!(names, vec!["BurgerZone", "BurgerZones"]);
    }

    #[test]
    fn test_rank_empty_query() {
        assert_eq!(
            rank("   ", STORES).unwrap_err(),
            SearchError::InvalidQuery("query is empty".to_string())
        );
    }
}
