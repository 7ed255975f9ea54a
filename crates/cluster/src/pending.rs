//! Reduce jobs the master is waiting on.
//!
//! A client handler registers the job before forwarding the command, then
//! awaits the receiver. The connection that carries the reducer's
//! `ReduceResult` completes it.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Reduced output keyed by pair key.
pub type ReduceOutput = BTreeMap<String, String>;

struct PendingReduce {
    sender: oneshot::Sender<ReduceOutput>,
    command: &'static str,
    created_at: Instant,
}

#[derive(Default)]
pub struct PendingReduces {
    pending: DashMap<String, PendingReduce>,
}

impl PendingReduces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a job id and the receiver its result will arrive on.
    pub fn register(&self, command: &'static str) -> (String, oneshot::Receiver<ReduceOutput>) {
        let job_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            job_id.clone(),
            PendingReduce {
                sender: tx,
                command,
                created_at: Instant::now(),
            },
        );
        tracing::debug!(job_id = %job_id, command, "Registered reduce job");
        (job_id, rx)
    }

    /// Hands the result to the waiting client. False for unknown or abandoned jobs.
    pub fn complete(&self, job_id: &str, result: ReduceOutput) -> bool {
        let Some((_, pending)) = self.pending.remove(job_id) else {
            tracing::warn!(job_id, "Result for unknown or expired reduce job");
            return false;
        };

        let elapsed = pending.created_at.elapsed();
        match pending.sender.send(result) {
            Ok(()) => {
                tracing::debug!(
                    job_id,
                    command = pending.command,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Completed reduce job"
                );
                true
            }
            Err(_) => {
                tracing::debug!(job_id, command = pending.command, "Reduce job waiter dropped");
                false
            }
        }
    }

    pub fn cancel(&self, job_id: &str) {
        self.pending.remove(job_id);
    }

    /// Drops jobs older than `ttl`, returning how many were removed.
    pub fn remove_expired(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.pending.retain(|job_id, job| {
            let elapsed = now.duration_since(job.created_at);
            if elapsed > ttl {
                tracing::warn!(
                    job_id = %job_id,
                    command = job.command,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Removing expired reduce job"
                );
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Periodically removes expired jobs until the store is dropped elsewhere.
pub async fn cleanup_task(store: Arc<PendingReduces>, ttl: Duration, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let removed = store.remove_expired(ttl);
        if removed > 0 {
            tracing::info!(removed, "Cleaned up expired reduce jobs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_complete() {
        let store = PendingReduces::new();
        let (job_id, rx) = store.register("SEARCH");
        assert_eq!(store.len(), 1);

        let mut result = ReduceOutput::new();
        result.insert("PizzaWorld".into(), "{}".into());
        assert!(store.complete(&job_id, result.clone()));
        assert!(store.is_empty());
        assert_eq!(rx.await.unwrap(), result);
    }

    #[test]
    fn test_complete_unknown_job() {
        let store = PendingReduces::new();
        assert!(!store.complete("nope", ReduceOutput::new()));
    }

    #[test]
    fn test_complete_after_waiter_dropped() {
        let store = PendingReduces::new();
        let (job_id, rx) = store.register("LIST_STORES");
        drop(rx);
        assert!(!store.complete(&job_id, ReduceOutput::new()));
    }

    #[test]
    fn test_remove_expired() {
        let store = PendingReduces::new();
        let (_job_id, _rx) = store.register("SEARCH");
        assert_eq!(store.remove_expired(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.remove_expired(Duration::from_millis(1)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_cancel() {
        let store = PendingReduces::new();
        let (job_id, _rx) = store.register("SEARCH");
        store.cancel(&job_id);
        assert!(store.is_empty());
    }
}
