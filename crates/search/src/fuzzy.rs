//! Edit distance and in-order character matching.

/// Levenshtein distance between two names, counted in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    if target.is_empty() {
        return a.chars().count();
    }

    // Single rolling row: row[j] is the distance from the processed prefix of `a`
    // to target[..j].
    let mut row: Vec<usize> = (0..=target.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in target.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[target.len()]
}

/// True when every char of `query` appears in `name`, in order.
///
/// "pzwrld" matches "pizzaworld"; "dlrow" does not.
pub fn fuzzy_match(name: &str, query: &str) -> bool {
    let mut rest = name.chars();
    query.chars().all(|q| rest.any(|c| c == q))
}
