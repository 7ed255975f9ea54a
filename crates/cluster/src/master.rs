//! The master: client front door, worker membership and job routing.

use crate::auth::{self, CredentialStore, Sessions};
use crate::command::{Command, Routing};
use crate::error::{ClusterError, Result};
use crate::pending::{self, PendingReduces, ReduceOutput};
use crate::protocol::{
    request, Connection, MasterReply, MasterRequest, ReplayOp, WorkerReply, WorkerRequest,
    ERROR_KEY,
};
use foodshare_core::config::MasterConfig;
use foodshare_core::ErrorCode;
use foodshare_mapreduce::{partition, replica, Pair};
use foodshare_telemetry::{metrics, Event, Timer};
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Timeouts and policy for a master.
#[derive(Debug, Clone)]
pub struct MasterSettings {
    pub worker_wait: Duration,
    pub reduce_timeout: Duration,
    pub worker_io_timeout: Duration,
    pub require_login: bool,
    pub session_ttl: Duration,
}

impl From<&MasterConfig> for MasterSettings {
    fn from(config: &MasterConfig) -> Self {
        Self {
            worker_wait: config.worker_wait(),
            reduce_timeout: config.reduce_timeout(),
            worker_io_timeout: config.worker_io_timeout(),
            require_login: config.require_login,
            session_ttl: config.session_ttl(),
        }
    }
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self::from(&MasterConfig::default())
    }
}

type WorkerCall = (usize, SocketAddr, WorkerRequest);
type WorkerResult = (usize, SocketAddr, Result<WorkerReply>);

/// What a worker learns from its handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: usize,
    pub total: usize,
    pub epoch: u64,
    pub replay: Vec<ReplayOp>,
}

#[derive(Debug, Default)]
struct Layout {
    /// Worker command endpoints; the index is the worker id
    workers: Vec<SocketAddr>,
    /// Bumped on every join and departure
    epoch: u64,
}

impl Layout {
    /// One `Reload` per worker, skipping `skip`.
    fn reloads(&self, skip: Option<SocketAddr>) -> Vec<WorkerCall> {
        let total = self.workers.len();
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, addr)| Some(**addr) != skip)
            .map(|(id, addr)| {
                let request = WorkerRequest::Reload {
                    id,
                    total,
                    epoch: self.epoch,
                };
                (id, *addr, request)
            })
            .collect()
    }
}

pub struct Master {
    settings: MasterSettings,
    layout: RwLock<Layout>,
    worker_count: watch::Sender<usize>,
    replay: Mutex<Vec<ReplayOp>>,
    credentials: CredentialStore,
    sessions: Arc<Sessions>,
    pending: Arc<PendingReduces>,
}

impl Master {
    pub fn new(settings: MasterSettings, credentials: CredentialStore) -> Self {
        let (worker_count, _) = watch::channel(0);
        let sessions = Arc::new(Sessions::new(settings.session_ttl));
        Self {
            settings,
            layout: RwLock::new(Layout::default()),
            worker_count,
            replay: Mutex::new(Vec::new()),
            credentials,
            sessions,
            pending: Arc::new(PendingReduces::new()),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.layout.read().workers.len()
    }

    pub fn workers(&self) -> Vec<SocketAddr> {
        self.layout.read().workers.clone()
    }

    /// Current layout version.
    pub fn epoch(&self) -> u64 {
        self.layout.read().epoch
    }

    /// Catalogue changes recorded so far, oldest first.
    pub fn replay_log(&self) -> Vec<ReplayOp> {
        self.replay.lock().clone()
    }

    /// Adds a worker and returns its place in the new layout with the replay log.
    ///
    /// A worker re-registering from the same endpoint keeps its id.
    pub fn register_worker(&self, addr: SocketAddr) -> Assignment {
        let (id, total, epoch, rejoined) = {
            let mut layout = self.layout.write();
            layout.epoch += 1;
            let (id, rejoined) = match layout.workers.iter().position(|w| *w == addr) {
                Some(id) => (id, true),
                None => {
                    layout.workers.push(addr);
                    (layout.workers.len() - 1, false)
                }
            };
            (id, layout.workers.len(), layout.epoch, rejoined)
        };
        self.worker_count.send_replace(total);
        metrics().gauge("master.workers", total as u64);

        Event::new(
            "worker_registered",
            serde_json::json!({
                "id": id,
                "addr": addr.to_string(),
                "total": total,
                "epoch": epoch,
                "rejoined": rejoined,
            }),
        )
        .log();

        Assignment {
            id,
            total,
            epoch,
            replay: self.replay_log(),
        }
    }

    /// Drops worker `id`, shifting higher ids down, and tells the survivors.
    ///
    /// Returns false for an unknown id.
    pub async fn remove_worker(&self, id: usize) -> bool {
        let calls: Vec<WorkerCall> = {
            let mut layout = self.layout.write();
            if id >= layout.workers.len() {
                return false;
            }
            let removed = layout.workers.remove(id);
            layout.epoch += 1;
            let (total, epoch) = (layout.workers.len(), layout.epoch);
            tracing::info!(id, addr = %removed, total, epoch, "Worker left");

            layout
                .reloads(None)
                .into_iter()
                .map(|(new_id, addr, reload)| {
                    let request = if new_id >= id {
                        WorkerRequest::Reassign {
                            id: new_id,
                            total,
                            epoch,
                        }
                    } else {
                        reload
                    };
                    (new_id, addr, request)
                })
                .collect()
        };

        let total = calls.len();
        self.worker_count.send_replace(total);
        metrics().gauge("master.workers", total as u64);
        Event::new("worker_removed", serde_json::json!({ "id": id, "total": total })).log();

        for (worker, addr, reply) in self.fan_out(calls).await {
            if let Err(e) = reply {
                tracing::warn!(worker, %addr, error = %e, "Failed to notify worker of new layout");
            }
        }
        true
    }

    /// Tells every worker, except `skip`, its place in the current layout.
    ///
    /// Broadcasts may overtake each other; workers keep the newest epoch.
    pub async fn broadcast_reload(&self, skip: Option<SocketAddr>) {
        let calls = self.layout.read().reloads(skip);

        for (worker, addr, reply) in self.fan_out(calls).await {
            match reply {
                Ok(WorkerReply::Reloaded) => {}
                Ok(other) => tracing::warn!(worker, %addr, reply = ?other, "Unexpected reload reply"),
                Err(e) => tracing::warn!(worker, %addr, error = %e, "Reload failed"),
            }
        }
    }

    /// Runs one client command to completion.
    pub async fn handle_client(&self, command: Command, token: Option<&str>) -> Result<MasterReply> {
        if self.settings.require_login && token.and_then(|t| self.sessions.user(t)).is_none() {
            return Err(ClusterError::LoginRequired);
        }

        let name = command.name();
        let _timer = Timer::start(format!("master.command.{}", name.to_ascii_lowercase()));
        metrics().increment("master.commands");
        tracing::debug!(command = name, "Client command");

        self.wait_for_workers().await?;

        match command.routing() {
            Routing::Directed(store) => {
                let store = store.to_owned();
                self.route_directed(&store, command).await
            }
            Routing::Catalogue => self.route_catalogue(command).await,
            Routing::Reduce => self.route_reduce(command).await,
        }
    }

    /// Hands a reducer result to its waiting client. Unknown jobs are still acked.
    pub fn complete_reduce(&self, job_id: &str, command: &str, result: ReduceOutput) -> MasterReply {
        if !self.pending.complete(job_id, result) {
            tracing::warn!(job_id, command, "Dropped reduce result nobody is waiting for");
        }
        MasterReply::Ack
    }

    pub fn register(&self, username: &str, password: &str) -> Result<MasterReply> {
        self.credentials.register(username, password)?;
        tracing::info!(username = username.trim(), "Registered account");
        Ok(MasterReply::Registered)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<MasterReply> {
        if !self.credentials.verify(username, password) {
            metrics().increment("master.login_failures");
            return Err(ClusterError::InvalidCredentials);
        }
        let token = self.sessions.open(username);
        tracing::info!(username = username.trim(), "Logged in");
        Ok(MasterReply::LoggedIn { token })
    }

    /// Dispatches one request; failures become `Error` replies.
    pub async fn handle_request(self: &Arc<Self>, peer: SocketAddr, request: MasterRequest) -> MasterReply {
        let result = match request {
            MasterRequest::Client { command, token } => {
                self.handle_client(command, token.as_deref()).await
            }
            MasterRequest::Register { username, password } => self.register(&username, &password),
            MasterRequest::Login { username, password } => self.login(&username, &password),
            MasterRequest::WorkerHandshake { port } => {
                let addr = SocketAddr::new(peer.ip(), port);
                let Assignment {
                    id,
                    total,
                    epoch,
                    replay,
                } = self.register_worker(addr);

                let master = Arc::clone(self);
                tokio::spawn(async move { master.broadcast_reload(Some(addr)).await });

                Ok(MasterReply::Assigned {
                    id,
                    total,
                    epoch,
                    replay,
                })
            }
            MasterRequest::WorkerShutdown { id } => {
                if !self.remove_worker(id).await {
                    tracing::warn!(id, %peer, "Shutdown notice for unknown worker");
                }
                Ok(MasterReply::Ack)
            }
            MasterRequest::ReduceResult {
                job_id,
                command,
                result,
            } => Ok(self.complete_reduce(&job_id, &command, result)),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(%peer, code = %e.code(), error = %e, "Request failed");
            MasterReply::error(&e)
        })
    }

    /// Accepts connections until `shutdown` resolves.
    pub async fn serve(self: Arc<Self>, listener: TcpListener, shutdown: impl Future<Output = ()>) -> Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "Master listening");

        let ttl = self.settings.reduce_timeout.saturating_mul(2);
        let cleanup = tokio::spawn(pending::cleanup_task(
            Arc::clone(&self.pending),
            ttl,
            Duration::from_secs(30),
        ));
        let session_sweep = tokio::spawn(auth::cleanup_task(
            Arc::clone(&self.sessions),
            (self.settings.session_ttl / 4).max(Duration::from_secs(1)),
        ));

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Master shutting down");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let master = Arc::clone(&self);
                        tokio::spawn(async move {
                            if let Err(e) = master.handle_connection(stream, peer).await {
                                tracing::debug!(%peer, error = %e, "Connection ended with error");
                            }
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
            }
        }

        cleanup.abort();
        session_sweep.abort();
        Ok(())
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        stream.set_nodelay(true)?;
        let mut conn = Connection::new(stream);
        loop {
            let request = match conn.recv::<MasterRequest>().await {
                Ok(Some(request)) => request,
                Ok(None) => return Ok(()),
                Err(e @ ClusterError::Codec(_)) => {
                    conn.send(&MasterReply::error(&e)).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let reply = self.handle_request(peer, request).await;
            conn.send(&reply).await?;
        }
    }

    async fn wait_for_workers(&self) -> Result<()> {
        let mut count = self.worker_count.subscribe();
        match tokio::time::timeout(self.settings.worker_wait, count.wait_for(|n| *n > 0)).await {
            Ok(Ok(_)) => Ok(()),
            _ => Err(ClusterError::NoWorkers),
        }
    }

    async fn route_directed(&self, store: &str, command: Command) -> Result<MasterReply> {
        let workers = self.workers();
        let total = workers.len();
        let primary = partition(store, total);
        let addr = *workers.get(primary).ok_or(ClusterError::NoWorkers)?;
        let request = WorkerRequest::Execute {
            job_id: Uuid::new_v4().to_string(),
            command,
            expected_partials: 1,
        };

        match self.call_worker(addr, &request).await {
            Ok(reply) => into_pairs(reply),
            Err(e) if e.is_transport() && total > 1 => {
                let backup = replica(primary, total);
                tracing::warn!(store, primary, backup, error = %e, "Primary worker failed, trying replica");
                metrics().increment("master.replica_failover");
                let addr = *workers.get(backup).ok_or(ClusterError::NoWorkers)?;
                into_pairs(self.call_worker(addr, &request).await?)
            }
            Err(e) => Err(e),
        }
    }

    async fn route_catalogue(&self, command: Command) -> Result<MasterReply> {
        let job_id = Uuid::new_v4().to_string();
        let calls = self
            .workers()
            .into_iter()
            .enumerate()
            .map(|(id, addr)| {
                let request = WorkerRequest::Execute {
                    job_id: job_id.clone(),
                    command: command.clone(),
                    expected_partials: 0,
                };
                (id, addr, request)
            })
            .collect();

        let mut first: Option<Vec<Pair>> = None;
        let mut last_error = None;
        for (worker, addr, reply) in self.fan_out(calls).await {
            match reply.and_then(into_pairs) {
                Ok(MasterReply::Pairs { pairs }) => {
                    first.get_or_insert(pairs);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(worker, %addr, error = %e, "Catalogue update failed on worker");
                    last_error = Some(e);
                }
            }
        }
        let pairs = match first {
            Some(pairs) => pairs,
            None => return Err(last_error.unwrap_or(ClusterError::NoWorkers)),
        };

        if !pairs.iter().any(|p| p.key == ERROR_KEY) {
            if let Some(op) = replay_op(&command) {
                self.replay.lock().push(op);
            }
            self.broadcast_reload(None).await;
        }
        Ok(MasterReply::Pairs { pairs })
    }

    async fn route_reduce(&self, command: Command) -> Result<MasterReply> {
        let workers = self.workers();
        let expected = workers.len();
        let (job_id, result) = self.pending.register(command.name());

        let calls = workers
            .into_iter()
            .enumerate()
            .map(|(id, addr)| {
                let request = WorkerRequest::Execute {
                    job_id: job_id.clone(),
                    command: command.clone(),
                    expected_partials: expected,
                };
                (id, addr, request)
            })
            .collect();

        for (worker, addr, reply) in self.fan_out(calls).await {
            let failure = match reply {
                Ok(WorkerReply::MappingSent) => continue,
                Ok(WorkerReply::Error { message }) => ClusterError::Remote {
                    code: ErrorCode::Internal,
                    message,
                },
                Ok(other) => ClusterError::Unexpected(format!("{other:?}")),
                Err(e) => e,
            };
            tracing::warn!(worker, %addr, job_id, error = %failure, "Worker could not map");
            self.pending.cancel(&job_id);
            return Err(failure);
        }

        match tokio::time::timeout(self.settings.reduce_timeout, result).await {
            Ok(Ok(result)) => Ok(MasterReply::Reduced { result }),
            Ok(Err(_)) => Err(ClusterError::Unexpected(format!("reduce job {job_id} was dropped"))),
            Err(_) => {
                self.pending.cancel(&job_id);
                metrics().increment("master.reduce_timeouts");
                Err(ClusterError::Timeout {
                    operation: "reduce",
                    after: self.settings.reduce_timeout,
                })
            }
        }
    }

    async fn call_worker(&self, addr: SocketAddr, message: &WorkerRequest) -> Result<WorkerReply> {
        request(addr, message, self.settings.worker_io_timeout).await
    }

    /// Sends each call concurrently; replies come back in worker id order.
    async fn fan_out(&self, calls: Vec<WorkerCall>) -> Vec<WorkerResult> {
        let timeout = self.settings.worker_io_timeout;
        let mut set = JoinSet::new();
        for (id, addr, message) in calls {
            set.spawn(async move { (id, addr, request::<_, _, WorkerReply>(addr, &message, timeout).await) });
        }

        let mut replies = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(reply) => replies.push(reply),
                Err(e) => tracing::error!(error = %e, "Worker call task failed"),
            }
        }
        replies.sort_by_key(|(id, _, _)| *id);
        replies
    }
}

fn into_pairs(reply: WorkerReply) -> Result<MasterReply> {
    match reply {
        WorkerReply::Pairs { pairs } => Ok(MasterReply::Pairs { pairs }),
        WorkerReply::Error { message } => Err(ClusterError::Remote {
            code: ErrorCode::Internal,
            message,
        }),
        other => Err(ClusterError::Unexpected(format!("{other:?}"))),
    }
}

fn replay_op(command: &Command) -> Option<ReplayOp> {
    match command {
        Command::AddStore { store } => Some(ReplayOp::AddStore(store.clone())),
        Command::RemoveStore { store } => Some(ReplayOp::RemoveStore(store.trim().to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodshare_market::Store;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    fn master() -> Master {
        Master::new(
            MasterSettings {
                worker_wait: Duration::from_millis(50),
                reduce_timeout: Duration::from_millis(200),
                worker_io_timeout: Duration::from_millis(200),
                require_login: false,
                session_ttl: Duration::from_secs(60),
            },
            CredentialStore::in_memory(),
        )
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let master = master();
        assert_eq!(master.register_worker(addr(1)).id, 0);
        let assigned = master.register_worker(addr(2));
        assert_eq!((assigned.id, assigned.total, assigned.epoch), (1, 2, 2));
        assert!(assigned.replay.is_empty());
    }

    #[test]
    fn test_reregistering_keeps_id() {
        let master = master();
        master.register_worker(addr(1));
        master.register_worker(addr(2));
        assert_eq!(
            master.register_worker(addr(1)),
            Assignment {
                id: 0,
                total: 2,
                epoch: 3,
                replay: Vec::new(),
            }
        );
    }

    #[test]
    fn test_reloads_carry_each_workers_id() {
        let master = master();
        for port in [1, 2, 3] {
            master.register_worker(addr(port));
        }
        let calls = master.layout.read().reloads(Some(addr(2)));
        let sent: Vec<_> = calls.into_iter().map(|(_, _, request)| request).collect();
        assert_eq!(
            sent,
            vec![
                WorkerRequest::Reload { id: 0, total: 3, epoch: 3 },
                WorkerRequest::Reload { id: 2, total: 3, epoch: 3 },
            ]
        );
    }

    #[tokio::test]
    async fn test_remove_worker_shifts_ids() {
        let master = master();
        for port in [1, 2, 3] {
            master.register_worker(addr(port));
        }
        // Notifications go to closed ports and only log warnings
        assert!(master.remove_worker(0).await);
        assert_eq!(master.workers(), vec![addr(2), addr(3)]);
        assert_eq!(master.epoch(), 4);
        assert!(!master.remove_worker(7).await);
        assert_eq!(master.worker_count(), 2);
        assert_eq!(master.epoch(), 4);
    }

    #[tokio::test]
    async fn test_no_workers() {
        let err = master()
            .handle_client(Command::ListStores, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::NoWorkers));
    }

    #[tokio::test]
    async fn test_login_required() {
        let mut settings = MasterSettings::default();
        settings.require_login = true;
        let master = Master::new(settings, CredentialStore::in_memory());

        let err = master.handle_client(Command::ListStores, None).await.unwrap_err();
        assert!(matches!(err, ClusterError::LoginRequired));
        let err = master
            .handle_client(Command::ListStores, Some("forged"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::LoginRequired));
    }

    /// Serves one worker whose mapping output goes to `reducer_addr`.
    async fn spawn_worker(reducer_addr: String) -> SocketAddr {
        let settings = crate::worker::WorkerSettings {
            bind: "127.0.0.1:0".into(),
            master_addr: "127.0.0.1:1".into(),
            reducer_addr,
            data_dir: std::env::temp_dir(),
            handshake_attempts: 1,
            io_timeout: Duration::from_millis(200),
        };
        let stores = vec![Store::new("PizzaWorld", "pizzeria", (37.98, 23.72).into())];
        let worker = Arc::new(crate::worker::Worker::new(settings, stores, 0, 1));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(worker.serve(listener, std::future::pending()));
        addr
    }

    #[tokio::test]
    async fn test_reduce_times_out_when_result_never_arrives() {
        // Acks every partial but never reports back to the master
        let reducer = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let reducer_addr = reducer.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = reducer.accept().await {
                tokio::spawn(async move {
                    let mut conn = Connection::new(stream);
                    while let Ok(Some(_)) = conn.recv::<crate::protocol::ReducerRequest>().await {
                        if conn.send(&crate::protocol::ReducerReply::Ack).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        let master = master();
        master.register_worker(spawn_worker(reducer_addr.to_string()).await);

        let err = master.handle_client(Command::ListStores, None).await.unwrap_err();
        assert!(matches!(err, ClusterError::Timeout { operation: "reduce", .. }));
        assert!(master.pending.is_empty());
    }

    #[tokio::test]
    async fn test_reduce_fails_fast_when_worker_cannot_map() {
        let master = Master::new(
            MasterSettings {
                worker_wait: Duration::from_millis(50),
                reduce_timeout: Duration::from_secs(30),
                worker_io_timeout: Duration::from_secs(2),
                require_login: false,
                session_ttl: Duration::from_secs(60),
            },
            CredentialStore::in_memory(),
        );
        master.register_worker(spawn_worker("127.0.0.1:1".into()).await);

        let started = std::time::Instant::now();
        let err = master.handle_client(Command::ListStores, None).await.unwrap_err();
        assert!(matches!(err, ClusterError::Remote { .. }));
        assert!(started.elapsed() < master.settings.reduce_timeout);
        assert!(master.pending.is_empty());
    }

    #[tokio::test]
    async fn test_idle_session_needs_fresh_login() {
        let mut settings = MasterSettings::default();
        settings.require_login = true;
        settings.session_ttl = Duration::from_millis(1);
        let master = Master::new(settings, CredentialStore::in_memory());

        let MasterReply::LoggedIn { token } = master.login("default", "default").unwrap() else {
            panic!("expected a session token");
        };
        std::thread::sleep(Duration::from_millis(10));
        let err = master
            .handle_client(Command::ListStores, Some(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::LoginRequired));
        assert!(master.sessions.is_empty());
    }

    #[test]
    fn test_register_and_login() {
        let master = master();
        assert_eq!(master.register("eleni", "pw").unwrap(), MasterReply::Registered);
        assert!(matches!(master.register("eleni", "pw"), Err(ClusterError::UserExists(_))));
        assert!(matches!(master.login("eleni", "nope"), Err(ClusterError::InvalidCredentials)));
        assert!(matches!(master.login("eleni", "pw"), Ok(MasterReply::LoggedIn { .. })));
    }

    #[test]
    fn test_complete_unknown_reduce_is_acked() {
        assert_eq!(
            master().complete_reduce("missing", "SEARCH", ReduceOutput::new()),
            MasterReply::Ack
        );
    }

    #[test]
    fn test_replay_op() {
        let store = Store::new("TacoPlace", "mexican", (37.98, 23.72).into());
        assert_eq!(
            replay_op(&Command::AddStore { store: store.clone() }),
            Some(ReplayOp::AddStore(store))
        );
        assert_eq!(
            replay_op(&Command::RemoveStore { store: " TacoPlace ".into() }),
            Some(ReplayOp::RemoveStore("TacoPlace".into()))
        );
        assert_eq!(replay_op(&Command::ListStores), None);
    }
}
