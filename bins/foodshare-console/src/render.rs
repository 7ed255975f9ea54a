//! Sending commands and printing replies.

use foodshare_cli::output::{format_duration, numeric_total, Status};
use foodshare_cli::progress::{finish_clear, spinner};
use foodshare_cluster::protocol::ERROR_KEY;
use foodshare_cluster::{ClusterError, Command, MasterClient, MasterReply};
use std::collections::BTreeMap;
use std::time::Instant;

/// Sends a command behind a spinner; failures are printed and yield `None`.
pub async fn dispatch(client: &MasterClient, command: Command) -> Option<MasterReply> {
    let name = command.name();
    let pb = spinner(&format!("Waiting for {name}..."));
    let started = Instant::now();
    let result = client.send(command).await;
    finish_clear(&pb);
    tracing::debug!(command = name, elapsed = %format_duration(started.elapsed()), "Reply received");

    match result {
        Ok(reply) => Some(reply),
        Err(e) => {
            report(e);
            None
        }
    }
}

pub fn report(err: ClusterError) {
    let err: foodshare_core::Error = err.into();
    Status::error(&format!("[{}] {}", err.code, err.message));
    if let Some(suggestion) = &err.suggestion {
        Status::info(suggestion);
    }
}

/// The first pair of a directed reply, split into success or failure.
pub fn outcome(reply: &MasterReply) -> Option<Result<&str, &str>> {
    match reply {
        MasterReply::Pairs { pairs } => pairs.first().map(|pair| {
            if pair.key == ERROR_KEY {
                Err(pair.value.as_str())
            } else {
                Ok(pair.value.as_str())
            }
        }),
        _ => None,
    }
}

pub fn show(reply: &MasterReply) {
    match reply {
        MasterReply::Pairs { pairs } => {
            for pair in pairs {
                if pair.key == ERROR_KEY {
                    Status::error(&pair.value);
                } else {
                    Status::success(&pair.value);
                }
            }
        }
        MasterReply::Reduced { result } => show_result(result, "No results."),
        MasterReply::Registered => Status::success("Registered."),
        MasterReply::LoggedIn { token } => Status::success(&format!("Logged in. Session {token}")),
        MasterReply::Error { message, .. } => Status::error(message),
        other => Status::info(&format!("{other:?}")),
    }
}

pub fn show_result(result: &BTreeMap<String, String>, empty: &str) {
    if result.is_empty() {
        Status::info(empty);
        return;
    }
    for (key, value) in result {
        Status::entry(key, value);
    }
}

/// Rows plus a `TOTAL` row summing the numeric values.
pub fn show_with_total(result: &BTreeMap<String, String>) {
    show_result(result, "No sales recorded.");
    if !result.is_empty() {
        let total = numeric_total(result.values().map(String::as_str));
        Status::entry("TOTAL", &total.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodshare_mapreduce::Pair;

    #[test]
    fn test_outcome() {
        let ok = MasterReply::Pairs {
            pairs: vec![Pair::new("PizzaWorld", "Gave * Stars Review for: PizzaWorld")],
        };
        assert_eq!(outcome(&ok), Some(Ok("Gave * Stars Review for: PizzaWorld")));

        let failed = MasterReply::Pairs {
            pairs: vec![Pair::new(ERROR_KEY, "Store X not found.")],
        };
        assert_eq!(outcome(&failed), Some(Err("Store X not found.")));
        assert_eq!(outcome(&MasterReply::Ack), None);
    }
}
