//! Reduce server: gathers every worker's mapping output for a job and pushes
//! the merged result to the master.

use crate::error::{ClusterError, Result};
use crate::protocol::{request, Connection, MasterReply, MasterRequest, ReducerReply, ReducerRequest};
use dashmap::DashMap;
use foodshare_core::config::ReducerConfig;
use foodshare_mapreduce::{merge_partials, JoinReducer, Pair, Reducer, UniqueReducer};
use foodshare_telemetry::metrics;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct ReducerSettings {
    pub bind: String,
    pub master_addr: String,
    pub job_ttl: Duration,
    pub io_timeout: Duration,
}

impl From<&ReducerConfig> for ReducerSettings {
    fn from(config: &ReducerConfig) -> Self {
        Self {
            bind: config.bind.clone(),
            master_addr: config.master_addr.clone(),
            job_ttl: config.job_ttl(),
            io_timeout: config.io_timeout(),
        }
    }
}

struct ReduceJob {
    command: String,
    expected: usize,
    partials: Vec<Vec<Pair>>,
    created_at: Instant,
}

/// A job whose partials have all arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub job_id: String,
    pub command: String,
    pub result: BTreeMap<String, String>,
}

pub struct ReduceServer {
    settings: ReducerSettings,
    jobs: DashMap<String, ReduceJob>,
    join: JoinReducer,
    unique: UniqueReducer,
}

impl ReduceServer {
    pub fn new(settings: ReducerSettings) -> Self {
        Self {
            settings,
            jobs: DashMap::new(),
            join: JoinReducer::default(),
            unique: UniqueReducer::default(),
        }
    }

    /// Listings name each store or product once, even when two workers both
    /// mapped it while the layout was changing.
    fn reducer_for(&self, command: &str) -> &dyn Reducer {
        match command {
            "LIST_STORES" | "DELETED_PRODUCTS" => &self.unique,
            _ => &self.join,
        }
    }

    /// Adds one worker's pairs to a job, returning the merged result once
    /// `expected` partials have arrived.
    pub fn submit(&self, job_id: &str, command: &str, expected: usize, pairs: Vec<Pair>) -> Option<Completed> {
        let complete = {
            let mut job = self.jobs.entry(job_id.to_string()).or_insert_with(|| ReduceJob {
                command: command.to_string(),
                expected: expected.max(1),
                partials: Vec::new(),
                created_at: Instant::now(),
            });
            job.partials.push(pairs);
            tracing::debug!(
                job_id,
                command,
                received = job.partials.len(),
                expected = job.expected,
                "Partial received"
            );
            job.partials.len() >= job.expected
        };
        if !complete {
            return None;
        }

        // A straggler racing the final partial finds the job already gone
        let (_, job) = self.jobs.remove(job_id)?;
        let elapsed = job.created_at.elapsed();
        let result = merge_partials(job.partials, self.reducer_for(&job.command));
        metrics().increment("reducer.jobs_completed");
        metrics().histogram("reducer.job_ms", elapsed.as_secs_f64() * 1000.0);
        tracing::info!(job_id, command = %job.command, keys = result.len(), "Job reduced");

        Some(Completed {
            job_id: job_id.to_string(),
            command: job.command,
            result,
        })
    }

    /// Drops jobs older than the configured TTL.
    pub fn sweep_expired(&self) -> usize {
        let ttl = self.settings.job_ttl;
        let mut removed = 0;
        self.jobs.retain(|job_id, job| {
            let alive = job.created_at.elapsed() <= ttl;
            if !alive {
                tracing::warn!(
                    job_id = %job_id,
                    command = %job.command,
                    received = job.partials.len(),
                    expected = job.expected,
                    "Dropping incomplete job"
                );
                removed += 1;
            }
            alive
        });
        if removed > 0 {
            metrics().increment_by("reducer.jobs_expired", removed as u64);
        }
        removed
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Every partial is acked on receipt; delivery to the master runs in the background.
    pub fn handle_request(&self, request: ReducerRequest) -> ReducerReply {
        match request {
            ReducerRequest::Partial {
                job_id,
                command,
                expected,
                pairs,
            } => {
                if let Some(completed) = self.submit(&job_id, &command, expected, pairs) {
                    let master = self.settings.master_addr.clone();
                    let timeout = self.settings.io_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = deliver(&master, completed, timeout).await {
                            tracing::error!(master = %master, error = %e, "Failed to deliver reduce result");
                        }
                    });
                }
                ReducerReply::Ack
            }
        }
    }

    pub async fn serve(self: Arc<Self>, listener: TcpListener, shutdown: impl Future<Output = ()>) -> Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "Reducer listening");

        let sweeper = {
            let server = Arc::clone(&self);
            let every = (server.settings.job_ttl / 4).max(Duration::from_secs(1));
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    server.sweep_expired();
                }
            })
        };

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let server = Arc::clone(&self);
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream).await {
                                tracing::debug!(%peer, error = %e, "Connection ended with error");
                            }
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
            }
        }

        sweeper.abort();
        Ok(())
    }

    async fn handle_connection(&self, stream: TcpStream) -> Result<()> {
        stream.set_nodelay(true)?;
        let mut conn = Connection::new(stream);
        loop {
            let reply = match conn.recv::<ReducerRequest>().await {
                Ok(Some(request)) => self.handle_request(request),
                Ok(None) => return Ok(()),
                Err(e @ ClusterError::Codec(_)) => ReducerReply::Error {
                    message: e.to_string(),
                },
                Err(e) => return Err(e),
            };
            conn.send(&reply).await?;
        }
    }
}

async fn deliver(master: &str, completed: Completed, timeout: Duration) -> Result<()> {
    let message = MasterRequest::ReduceResult {
        job_id: completed.job_id,
        command: completed.command,
        result: completed.result,
    };
    let reply: MasterReply = request(master, &message, timeout).await?;
    reply.into_result()?;
    Ok(())
}
