//! Reducers used by the reduce server and local jobs.

use crate::job::Reducer;

/// Joins values in arrival order.
#[derive(Debug, Clone)]
pub struct JoinReducer {
    separator: String,
}

impl JoinReducer {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for JoinReducer {
    fn default() -> Self {
        Self::new(", ")
    }
}

impl Reducer for JoinReducer {
    fn reduce(&self, _key: &str, values: &[String]) -> String {
        values.join(&self.separator)
    }
}

/// Joins values, dropping repeats but keeping first-seen order.
#[derive(Debug, Clone)]
pub struct UniqueReducer {
    separator: String,
}

impl UniqueReducer {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for UniqueReducer {
    fn default() -> Self {
        Self::new(", ")
    }
}

impl Reducer for UniqueReducer {
    fn reduce(&self, _key: &str, values: &[String]) -> String {
        let mut seen: Vec<&str> = Vec::with_capacity(values.len());
        for value in values {
            if !seen.contains(&value.as_str()) {
                seen.push(value);
            }
        }
        seen.join(&self.separator)
    }
}
