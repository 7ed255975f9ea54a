//! Mapper and reducer traits and a local job runner.

use crate::pair::Pair;
use std::collections::{BTreeMap, HashMap};

/// Turns one input record into intermediate pairs.
pub trait Mapper<K, V>: Sync {
    fn map(&self, key: &K, value: &V) -> Vec<Pair>;
}

/// Folds every value seen for one key into a single result.
pub trait Reducer: Sync {
    fn reduce(&self, key: &str, values: &[String]) -> String;
}

impl<K, V, F> Mapper<K, V> for F
where
    F: Fn(&K, &V) -> Vec<Pair> + Sync,
{
    fn map(&self, key: &K, value: &V) -> Vec<Pair> {
        self(key, value)
    }
}

/// A map phase followed by a reduce phase over in-memory inputs.
pub struct MapReduceJob<M, R> {
    mapper: M,
    reducer: R,
}

impl<M, R: Reducer> MapReduceJob<M, R> {
    pub fn new(mapper: M, reducer: R) -> Self {
        Self { mapper, reducer }
    }

    /// Runs only the map phase, keeping input order.
    pub fn map_all<K, V>(&self, inputs: &[(K, V)]) -> Vec<Pair>
    where
        M: Mapper<K, V>,
        K: Sync,
        V: Sync,
    {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            inputs
                .par_iter()
                .flat_map_iter(|(k, v)| self.mapper.map(k, v))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            inputs
                .iter()
                .flat_map(|(k, v)| self.mapper.map(k, v))
                .collect()
        }
    }

    /// Maps every input, groups by key and reduces each group.
    pub fn execute<K, V>(&self, inputs: &[(K, V)]) -> BTreeMap<String, String>
    where
        M: Mapper<K, V>,
        K: Sync,
        V: Sync,
    {
        reduce_groups(group(self.map_all(inputs)), &self.reducer)
    }
}

/// Groups values by key. Keys keep first-seen order, values keep arrival order.
pub fn group<I>(pairs: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = Pair>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for Pair { key, value } in pairs {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(value),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![value]));
            }
        }
    }
    groups
}

/// Merges several workers' mapping outputs into one reduced result.
pub fn merge_partials<I, R>(partials: I, reducer: &R) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = Vec<Pair>>,
    R: Reducer + ?Sized,
{
    reduce_groups(group(partials.into_iter().flatten()), reducer)
}

fn reduce_groups<R>(groups: Vec<(String, Vec<String>)>, reducer: &R) -> BTreeMap<String, String>
where
    R: Reducer + ?Sized,
{
    groups
        .into_iter()
        .map(|(key, values)| {
            let reduced = reducer.reduce(&key, &values);
            (key, reduced)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducers::JoinReducer;

    struct WordCount;

    impl Mapper<usize, String> for WordCount {
        fn map(&self, _line: &usize, text: &String) -> Vec<Pair> {
            text.split_whitespace().map(|w| Pair::new(w, "1")).collect()
        }
    }

    struct Sum;

    impl Reducer for Sum {
        fn reduce(&self, _key: &str, values: &[String]) -> String {
            values
                .iter()
                .filter_map(|v| v.parse::<u64>().ok())
                .sum::<u64>()
                .to_string()
        }
    }

    #[test]
    fn test_word_count() {
        let inputs = vec![
            (0, "pizza coffee pizza".to_string()),
            (1, "coffee pizza".to_string()),
        ];
        let result = MapReduceJob::new(WordCount, Sum).execute(&inputs);

        assert_eq!(result.get("pizza").map(String::as_str), Some("3"));
        assert_eq!(result.get("coffee").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_closure_mapper() {
        let mapper = |k: &String, v: &u32| vec![Pair::new(k.clone(), v.to_string())];
        let job = MapReduceJob::new(mapper, JoinReducer::default());
        let result = job.execute(&[("a".to_string(), 1), ("a".to_string(), 2)]);
        assert_eq!(result["a"], "1, 2");
    }

    #[test]
    fn test_group_keeps_order() {
        let groups = group(vec![
            Pair::new("b", "1"),
            Pair::new("a", "2"),
            Pair::new("b", "3"),
        ]);
        assert_eq!(
            groups,
            vec![
                ("b".to_string(), vec!["1".to_string(), "3".to_string()]),
                ("a".to_string(), vec!["2".to_string()]),
            ]
        );
    }

    #[test]
    fn test_merge_partials() {
        let worker_a = vec![Pair::new("PizzaWorld", "4")];
        let worker_b = vec![Pair::new("CoffeeCorner", "0"), Pair::new("PizzaWorld", "1")];

        let merged = merge_partials(vec![worker_a, worker_b, Vec::new()], &JoinReducer::default());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["PizzaWorld"], "4, 1");
        assert_eq!(merged["CoffeeCorner"], "0");
    }

    #[test]
    fn test_empty_job() {
        let inputs: Vec<(usize, String)> = Vec::new();
        assert!(MapReduceJob::new(WordCount, Sum).execute(&inputs).is_empty());
    }
}
