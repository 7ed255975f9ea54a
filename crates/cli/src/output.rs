//! Terminal output utilities
//!
//! Provides consistent formatting for console output.

use owo_colors::OwoColorize;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a numbered menu entry
    pub fn option(number: usize, label: &str) {
        println!("  {} {}", format!("{number:>2}.").cyan(), label);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print a subheader
    pub fn subheader(message: &str) {
        println!();
        println!("{}", message.bold().dimmed());
    }

    /// Print a key/value row, expanding JSON values over several lines
    pub fn entry(key: &str, value: &str) {
        let pretty = pretty_value(value);
        if pretty.contains('\n') {
            println!("{}", key.bold());
            for line in pretty.lines() {
                println!("    {line}");
            }
        } else {
            println!("{}: {}", key.bold(), pretty);
        }
    }
}

/// Pretty-print a value that is itself a JSON document; other values pass through
pub fn pretty_value(value: &str) -> String {
    let trimmed = value.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return value.to_string();
    }
    serde_json::from_str::<serde_json::Value>(trimmed)
        .and_then(|json| serde_json::to_string_pretty(&json))
        .unwrap_or_else(|_| value.to_string())
}

/// Sum the integer values of a result set, ignoring non-numeric entries
pub fn numeric_total<'a, I>(values: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(|v| v.split(','))
        .filter_map(|v| v.trim().parse::<u64>().ok())
        .sum()
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration_ms() {
        let d = Duration::from_millis(500);
        assert_eq!(format_duration(d), "500ms");
    }

    #[test]
    fn test_format_duration_secs() {
        let d = Duration::from_secs_f32(5.5);
        assert_eq!(format_duration(d), "5.5s");
    }

    #[test]
    fn test_format_duration_mins() {
        let d = Duration::from_secs(125);
        assert_eq!(format_duration(d), "2m 5s");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1, "store", "stores"), "1 store");
        assert_eq!(format_count(3, "store", "stores"), "3 stores");
    }

    #[test]
    fn test_pretty_value_expands_json() {
        let pretty = pretty_value(r#"{"StoreName":"PizzaWorld","Stars":4}"#);
        assert!(pretty.contains('\n'));
        assert!(pretty.contains("\"StoreName\": \"PizzaWorld\""));
    }

    #[test]
    fn test_pretty_value_passthrough() {
        assert_eq!(pretty_value("Store added."), "Store added.");
        assert_eq!(pretty_value("{not json"), "{not json");
    }

    #[test]
    fn test_numeric_total() {
        assert_eq!(numeric_total(["3", "0", "7"]), 10);
        assert_eq!(numeric_total(["2, 5", "n/a"]), 7);
    }
}
