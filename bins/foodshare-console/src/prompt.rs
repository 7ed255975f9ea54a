//! Line-based prompts on stdin.
//!
//! One `Prompt` owns stdin for the whole session; a second buffered reader
//! would swallow lines the first had already read ahead.

use anyhow::Result;
use foodshare_cli::output::Status;
use owo_colors::OwoColorize;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Prompt<R = BufReader<Stdin>> {
    lines: Lines<R>,
}

impl Prompt {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { lines: reader.lines() }
    }

    /// Trimmed answer, or `None` once stdin is closed.
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{} ", label.bold());
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }

    /// Asks until the answer is non-empty.
    pub async fn ask_required(&mut self, label: &str) -> Result<Option<String>> {
        loop {
            match self.ask(label).await? {
                Some(answer) if answer.is_empty() => Status::warning("A value is required"),
                other => return Ok(other),
            }
        }
    }

    /// Asks until the answer parses and passes `accept`.
    pub async fn ask_parsed<T, F>(&mut self, label: &str, accept: F) -> Result<Option<T>>
    where
        T: FromStr,
        F: Fn(&T) -> bool,
    {
        loop {
            let Some(answer) = self.ask(label).await? else {
                return Ok(None);
            };
            match answer.parse::<T>() {
                Ok(value) if accept(&value) => return Ok(Some(value)),
                _ => Status::warning(&format!("'{answer}' is not a valid choice")),
            }
        }
    }

    /// Like [`Prompt::ask_parsed`], but a blank answer means "skip".
    pub async fn ask_optional<T, F>(&mut self, label: &str, accept: F) -> Result<Option<T>>
    where
        T: FromStr,
        F: Fn(&T) -> bool,
    {
        loop {
            let Some(answer) = self.ask(label).await? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<T>() {
                Ok(value) if accept(&value) => return Ok(Some(value)),
                _ => Status::warning(&format!("'{answer}' is not a valid choice")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_reader_serves_every_question() {
        let input: &[u8] = b"hunter2\n 8 \nabc\n10\n";
        let mut prompt = Prompt::from_reader(input);

        assert_eq!(prompt.ask("Password:").await.unwrap().as_deref(), Some("hunter2"));
        let choice = prompt.ask_parsed::<usize, _>("Choose:", |n| (1..=10).contains(n)).await.unwrap();
        assert_eq!(choice, Some(8));
        // "abc" is rejected and the next line answers
        let choice = prompt.ask_parsed::<usize, _>("Choose:", |n| (1..=10).contains(n)).await.unwrap();
        assert_eq!(choice, Some(10));
        assert_eq!(prompt.ask("Anything:").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_required_and_optional_answers() {
        let input: &[u8] = b"\nPizzaWorld\n\n";
        let mut prompt = Prompt::from_reader(input);

        let store = prompt.ask_required("Store name:").await.unwrap();
        assert_eq!(store.as_deref(), Some("PizzaWorld"));
        let stars = prompt.ask_optional::<u32, _>("Stars:", |_| true).await.unwrap();
        assert_eq!(stars, None);
    }
}
