//! Worker node: owns a hash partition of the catalogue and runs map phases.
//!
//! Every worker loads the full catalogue. A store is served by the worker at
//! `partition(name, total)` and by the next worker as its replica; map phases
//! only cover the stores a worker owns so each store is counted once.

use crate::command::Command;
use crate::error::{ClusterError, Result};
use crate::protocol::{
    request, Connection, MasterReply, MasterRequest, ReducerReply, ReducerRequest, ReplayOp,
    WorkerReply, WorkerRequest, ERROR_KEY,
};
use foodshare_core::config::WorkerConfig;
use foodshare_core::retry::{retry, RetryConfig};
use foodshare_mapreduce::{
    deleted_product_pairs, partition, replica, JoinReducer, ListStoresMapper, MapReduceJob, Mapper,
    Pair, SalesMapper, SearchMapper,
};
use foodshare_market::{catalogue, MarketError, ProductLedger, Store, StoreRegistry};
use foodshare_telemetry::{metrics, Event, Timer};
use parking_lot::Mutex;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

const PURCHASE_FAILED: &str = "Purchase failed: insufficient stock or product not found.";

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub bind: String,
    pub master_addr: String,
    pub reducer_addr: String,
    pub data_dir: PathBuf,
    pub handshake_attempts: u32,
    pub io_timeout: Duration,
}

impl From<&WorkerConfig> for WorkerSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            bind: config.bind.clone(),
            master_addr: config.master_addr.clone(),
            reducer_addr: config.reducer_addr.clone(),
            data_dir: config.data_dir.clone(),
            handshake_attempts: config.handshake_attempts,
            io_timeout: config.io_timeout(),
        }
    }
}

#[derive(Debug)]
struct WorkerState {
    id: usize,
    total: usize,
    /// Layout version of `id` and `total`
    epoch: u64,
    /// False when running standalone after a failed handshake
    joined: bool,
    catalogue: StoreRegistry,
    ledger: ProductLedger,
}

impl WorkerState {
    fn owns(&self, store: &str) -> bool {
        partition(store.trim(), self.total) == self.id
    }

    fn serves(&self, store: &str) -> bool {
        let primary = partition(store.trim(), self.total);
        primary == self.id || (self.total > 1 && replica(primary, self.total) == self.id)
    }

    fn owned_inputs(&self) -> Vec<(String, Store)> {
        self.catalogue
            .iter()
            .filter(|store| self.owns(&store.name))
            .map(|store| (store.name.clone(), store.clone()))
            .collect()
    }

    /// Takes a layout unless it is older than the one held. Returns whether it applied.
    fn apply_layout(&mut self, id: usize, total: usize, epoch: u64) -> bool {
        if epoch < self.epoch {
            tracing::debug!(held = self.epoch, epoch, id, total, "Ignoring stale layout");
            return false;
        }
        self.id = id;
        self.total = total.max(1);
        self.epoch = epoch;
        true
    }

    fn apply_replay(&mut self, replay: Vec<ReplayOp>) {
        for op in replay {
            match op {
                ReplayOp::AddStore(store) => {
                    let name = store.name.clone();
                    if let Err(e) = self.catalogue.add(store) {
                        tracing::debug!(store = %name, error = %e, "Replayed store already present");
                    }
                }
                ReplayOp::RemoveStore(name) => {
                    if let Err(e) = self.catalogue.remove(&name) {
                        tracing::debug!(store = %name, error = %e, "Replayed removal of unknown store");
                    }
                }
            }
        }
    }
}

pub struct Worker {
    settings: WorkerSettings,
    state: Mutex<WorkerState>,
}

impl Worker {
    /// A worker holding `stores`, assigned `id` of `total`.
    pub fn new(settings: WorkerSettings, stores: Vec<Store>, id: usize, total: usize) -> Self {
        Self {
            settings,
            state: Mutex::new(WorkerState {
                id,
                total: total.max(1),
                epoch: 0,
                joined: false,
                catalogue: stores.into_iter().collect(),
                ledger: ProductLedger::new(),
            }),
        }
    }

    /// Binds the command port, loads the catalogue and joins the master.
    ///
    /// When the master cannot be reached the worker runs standalone as 0 of 1.
    pub async fn start(settings: WorkerSettings) -> Result<(Arc<Self>, TcpListener)> {
        let listener = TcpListener::bind(&settings.bind).await?;
        let port = listener.local_addr()?.port();

        let stores = catalogue::load_dir(&settings.data_dir)?;
        tracing::info!(stores = stores.len(), dir = %settings.data_dir.display(), "Catalogue loaded");

        let worker = Arc::new(Self::new(settings, stores, 0, 1));
        match worker.handshake(port).await {
            Ok(MasterReply::Assigned {
                id,
                total,
                epoch,
                replay,
            }) => {
                let mut state = worker.state.lock();
                state.apply_layout(id, total, epoch);
                state.joined = true;
                state.apply_replay(replay);
                tracing::info!(id, total, epoch, port, "Joined master");
            }
            Ok(other) => {
                tracing::warn!(reply = ?other, "Unexpected handshake reply, running standalone as worker 0 of 1");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Handshake failed, running standalone as worker 0 of 1");
            }
        }
        Ok((worker, listener))
    }

    async fn handshake(&self, port: u16) -> Result<MasterReply> {
        let config = RetryConfig::handshake(self.settings.handshake_attempts);
        let master = self.settings.master_addr.as_str();
        let timeout = self.settings.io_timeout;

        let assigned = retry(&config, |attempt| async move {
            tracing::debug!(attempt, master, "Handshake attempt");
            let reply: MasterReply =
                request(master, &MasterRequest::WorkerHandshake { port }, timeout).await?;
            reply.into_result()
        })
        .await?;
        Ok(assigned.value)
    }

    /// Current `(id, total)`.
    pub fn assignment(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.id, state.total)
    }

    /// Version of the layout behind [`Worker::assignment`].
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Names of the stores this worker owns, sorted.
    pub fn owned_stores(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .catalogue
            .iter()
            .filter(|store| state.owns(&store.name))
            .map(|store| store.name.clone())
            .collect()
    }

    pub fn store(&self, name: &str) -> Option<Store> {
        self.state.lock().catalogue.get(name).cloned()
    }

    pub async fn handle_request(&self, request: WorkerRequest) -> WorkerReply {
        match request {
            WorkerRequest::Execute {
                job_id,
                command,
                expected_partials,
            } => self.execute(&job_id, command, expected_partials).await,
            WorkerRequest::Reload { id, total, epoch } => {
                self.reload(id, total, epoch);
                WorkerReply::Reloaded
            }
            WorkerRequest::Reassign { id, total, epoch } => {
                self.reassign(id, total, epoch);
                WorkerReply::Reloaded
            }
        }
    }

    /// Runs one command. Map phases ship their pairs to the reducer.
    pub async fn execute(&self, job_id: &str, command: Command, expected: usize) -> WorkerReply {
        let name = command.name();
        let _timer = Timer::start(format!("worker.command.{}", name.to_ascii_lowercase()));
        metrics().increment("worker.commands");

        let mapped = match &command {
            Command::Search { filter } => Some(self.map_owned(SearchMapper::new(filter.clone()))),
            Command::AggregateSales { product } => Some(self.map_owned(SalesMapper::new(product.trim()))),
            Command::ListStores => Some(self.map_owned(ListStoresMapper)),
            Command::DeletedProducts => Some(deleted_product_pairs(self.state.lock().ledger.deleted())),
            _ => None,
        };

        match mapped {
            Some(pairs) => match self.send_partial(job_id, name, expected, pairs).await {
                Ok(()) => WorkerReply::MappingSent,
                Err(e) => {
                    tracing::warn!(job_id, command = name, error = %e, "Could not deliver mapping output");
                    WorkerReply::Error {
                        message: e.to_string(),
                    }
                }
            },
            None => WorkerReply::Pairs {
                pairs: self.apply(command),
            },
        }
    }

    /// Re-partitions for a new worker count. Stale epochs are ignored.
    pub fn reload(&self, id: usize, total: usize, epoch: u64) -> bool {
        let mut state = self.state.lock();
        let applied = state.apply_layout(id, total, epoch);
        if applied {
            tracing::info!(id, total = state.total, epoch, "Re-partitioned");
        }
        applied
    }

    /// Takes a new id after another worker left. Stale epochs are ignored.
    pub fn reassign(&self, id: usize, total: usize, epoch: u64) -> bool {
        let mut state = self.state.lock();
        let applied = state.apply_layout(id, total, epoch);
        if applied {
            tracing::info!(id, total = state.total, epoch, "Reassigned");
        }
        applied
    }

    fn map_owned<M: Mapper<String, Store>>(&self, mapper: M) -> Vec<Pair> {
        let inputs = self.state.lock().owned_inputs();
        MapReduceJob::new(mapper, JoinReducer::default()).map_all(&inputs)
    }

    async fn send_partial(
        &self,
        job_id: &str,
        command: &str,
        expected: usize,
        pairs: Vec<Pair>,
    ) -> Result<()> {
        let count = pairs.len();
        let partial = ReducerRequest::Partial {
            job_id: job_id.to_string(),
            command: command.to_string(),
            expected,
            pairs,
        };
        let reply: ReducerReply =
            request(self.settings.reducer_addr.as_str(), &partial, self.settings.io_timeout).await?;
        match reply {
            ReducerReply::Ack => {
                tracing::debug!(job_id, command, pairs = count, "Mapping output sent");
                Ok(())
            }
            ReducerReply::Error { message } => Err(ClusterError::Unexpected(message)),
        }
    }

    /// Applies a directed or catalogue command and returns the reply pairs.
    fn apply(&self, command: Command) -> Vec<Pair> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        match command {
            Command::AddStore { store } => {
                let name = store.name.clone();
                match state.catalogue.add(store) {
                    Ok(()) => {
                        Event::new("store_added", serde_json::json!({ "store": name })).log();
                        vec![Pair::new(name.as_str(), format!("Store {name} added successfully."))]
                    }
                    Err(e) => vec![Pair::new(ERROR_KEY, e.to_string())],
                }
            }
            Command::RemoveStore { store } => match state.catalogue.remove(&store) {
                Ok(removed) => {
                    Event::new("store_removed", serde_json::json!({ "store": removed.name })).log();
                    vec![Pair::new(
                        removed.name.as_str(),
                        format!("Store {} removed successfully.", removed.name),
                    )]
                }
                Err(e) => vec![Pair::new(ERROR_KEY, e.to_string())],
            },
            directed => {
                let Some(name) = directed_store(&directed) else {
                    return vec![Pair::new(ERROR_KEY, format!("{} is not a store command", directed.name()))];
                };
                let name = name.trim().to_string();
                if !state.serves(&name) || !state.catalogue.contains(&name) {
                    return vec![Pair::new(ERROR_KEY, state.catalogue.not_found(&name))];
                }
                let WorkerState { catalogue, ledger, .. } = state;
                let Some(store) = catalogue.get_mut(&name) else {
                    return vec![Pair::new(ERROR_KEY, MarketError::StoreNotFound(name).to_string())];
                };
                vec![apply_to_store(store, ledger, directed)]
            }
        }
    }

    /// Accepts master connections until `shutdown` resolves.
    pub async fn serve(self: Arc<Self>, listener: TcpListener, shutdown: impl Future<Output = ()>) -> Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "Worker listening");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let worker = Arc::clone(&self);
                        tokio::spawn(async move {
                            if let Err(e) = worker.handle_connection(stream).await {
                                tracing::debug!(%peer, error = %e, "Connection ended with error");
                            }
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
            }
        }
        Ok(())
    }

    async fn handle_connection(&self, stream: TcpStream) -> Result<()> {
        stream.set_nodelay(true)?;
        let mut conn = Connection::new(stream);
        while let Some(request) = conn.recv::<WorkerRequest>().await? {
            let reply = self.handle_request(request).await;
            conn.send(&reply).await?;
        }
        Ok(())
    }

    /// Tells the master this worker is leaving. A standalone worker has nobody to tell.
    pub async fn notify_shutdown(&self) -> Result<()> {
        let (id, joined) = {
            let state = self.state.lock();
            (state.id, state.joined)
        };
        if !joined {
            return Ok(());
        }
        let reply: MasterReply = request(
            self.settings.master_addr.as_str(),
            &MasterRequest::WorkerShutdown { id },
            self.settings.io_timeout,
        )
        .await?;
        reply.into_result()?;
        tracing::info!(id, "Master notified of shutdown");
        Ok(())
    }
}

fn directed_store(command: &Command) -> Option<&str> {
    match command {
        Command::PurchaseProduct { store, .. }
        | Command::Review { store, .. }
        | Command::AddProduct { store, .. }
        | Command::RemoveProduct { store, .. }
        | Command::UpdateProductAmount { store, .. }
        | Command::IncrementProductAmount { store, .. }
        | Command::DecrementProductAmount { store, .. } => Some(store),
        _ => None,
    }
}

fn apply_to_store(store: &mut Store, ledger: &mut ProductLedger, command: Command) -> Pair {
    let key = store.name.clone();
    let message = match command {
        Command::PurchaseProduct { product, quantity, .. } => {
            match store.purchase(&product, quantity) {
                Ok(remaining) => {
                    metrics().increment("worker.purchases");
                    format!(
                        "Successfully purchased {} of {} from store {}.|{}",
                        quantity,
                        product.trim(),
                        store.name,
                        remaining
                    )
                }
                Err(MarketError::InsufficientStock { .. } | MarketError::ProductNotFound { .. }) => {
                    return Pair::new(ERROR_KEY, PURCHASE_FAILED);
                }
                Err(e) => return Pair::new(ERROR_KEY, e.to_string()),
            }
        }
        Command::Review { stars, .. } => match store.apply_review(stars) {
            Ok(()) => format!(
                "Gave {} Stars Review for: {}",
                "*".repeat(stars as usize),
                store.name
            ),
            Err(e) => return Pair::new(ERROR_KEY, e.to_string()),
        },
        Command::AddProduct { product, .. } => ledger.add_product(store, product),
        Command::RemoveProduct { product, .. } => ledger.remove_product(store, &product),
        Command::UpdateProductAmount { product, amount, .. } => {
            ledger.update_amount(store, &product, amount)
        }
        Command::IncrementProductAmount { product, amount, .. } => {
            ledger.increment_amount(store, &product, amount)
        }
        Command::DecrementProductAmount { product, amount, .. } => {
            ledger.decrement_amount(store, &product, amount)
        }
        other => return Pair::new(ERROR_KEY, format!("{} is not a store command", other.name())),
    };
    Pair::new(key, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodshare_market::Product;

    fn settings() -> WorkerSettings {
        WorkerSettings {
            bind: "127.0.0.1:0".into(),
            master_addr: "127.0.0.1:1".into(),
            reducer_addr: "127.0.0.1:1".into(),
            data_dir: PathBuf::from("missing"),
            handshake_attempts: 1,
            io_timeout: Duration::from_millis(100),
        }
    }

    fn stores() -> Vec<Store> {
        vec![
            Store::new("PizzaWorld", "pizzeria", (37.9932963, 23.733413).into())
                .with_products(vec![Product::new("pepperoni", "pizza", 5, 12.0)]),
            Store::new("CoffeeCorner", "coffee", (37.9838, 23.7275).into())
                .with_products(vec![Product::new("espresso", "coffee", 40, 2.5)]),
            Store::new("SeaFoodExpress", "seafood", (40.6401, 22.9444).into()),
            Store::new("SweetTooth", "desserts", (37.97, 23.73).into()),
        ]
    }

    fn single() -> Worker {
        Worker::new(settings(), stores(), 0, 1)
    }

    fn only(pairs: Vec<Pair>) -> Pair {
        assert_eq!(pairs.len(), 1, "{pairs:?}");
        pairs.into_iter().next().unwrap()
    }

    #[test]
    fn test_ownership_follows_partition() {
        // n=3: SweetTooth→0, SeaFoodExpress→1, PizzaWorld→2, CoffeeCorner→0
        let worker = Worker::new(settings(), stores(), 0, 3);
        assert_eq!(worker.owned_stores(), vec!["CoffeeCorner", "SweetTooth"]);

        assert!(worker.reassign(2, 3, 1));
        assert_eq!(worker.owned_stores(), vec!["PizzaWorld"]);
    }

    #[test]
    fn test_stale_layout_is_ignored() {
        let worker = Worker::new(settings(), stores(), 0, 1);
        assert!(worker.reload(1, 4, 4));
        // A reload for three workers sent before the fourth joined arrives late
        assert!(!worker.reload(1, 3, 3));
        assert_eq!(worker.assignment(), (1, 4));
        assert!(!worker.reassign(0, 2, 2));
        assert_eq!(worker.assignment(), (1, 4));

        // The same epoch again is harmless
        assert!(worker.reload(1, 4, 4));
        assert!(worker.reassign(0, 3, 5));
        assert_eq!((worker.assignment(), worker.epoch()), ((0, 3), 5));
    }

    #[test]
    fn test_purchase() {
        let worker = single();
        let pair = only(worker.apply(Command::PurchaseProduct {
            store: "PizzaWorld".into(),
            product: "pepperoni".into(),
            quantity: 2,
        }));
        assert_eq!(pair.key, "PizzaWorld");
        assert_eq!(pair.value, "Successfully purchased 2 of pepperoni from store PizzaWorld.|3");
        assert_eq!(worker.store("PizzaWorld").unwrap().sales_for("pepperoni"), 2);
    }

    #[test]
    fn test_purchase_failure() {
        let worker = single();
        let pair = only(worker.apply(Command::PurchaseProduct {
            store: "PizzaWorld".into(),
            product: "pepperoni".into(),
            quantity: 50,
        }));
        assert_eq!(pair, Pair::new(ERROR_KEY, PURCHASE_FAILED));
    }

    #[test]
    fn test_unknown_store_suggests() {
        let pair = only(single().apply(Command::Review {
            store: "PizzaWorl".into(),
            stars: 4,
        }));
        assert_eq!(pair.key, ERROR_KEY);
        assert_eq!(pair.value, "Store PizzaWorl not found. Did you mean PizzaWorld?");
    }

    #[test]
    fn test_review_message() {
        let pair = only(single().apply(Command::Review {
            store: "CoffeeCorner".into(),
            stars: 3,
        }));
        assert_eq!(pair.value, "Gave *** Stars Review for: CoffeeCorner");
    }

    #[test]
    fn test_unserved_store_is_not_found() {
        // PizzaWorld is primary on 2 and replicated on 0 with three workers
        let worker = Worker::new(settings(), stores(), 1, 3);
        let pair = only(worker.apply(Command::Review {
            store: "PizzaWorld".into(),
            stars: 5,
        }));
        assert_eq!(pair.key, ERROR_KEY);

        let replica = Worker::new(settings(), stores(), 0, 3);
        let pair = only(replica.apply(Command::Review {
            store: "PizzaWorld".into(),
            stars: 5,
        }));
        assert_eq!(pair.key, "PizzaWorld");
    }

    #[test]
    fn test_catalogue_commands() {
        let worker = single();
        let taco = Store::new("TacoPlace", "mexican", (37.98, 23.72).into());

        let added = only(worker.apply(Command::AddStore { store: taco.clone() }));
        assert_eq!(added.value, "Store TacoPlace added successfully.");
        let again = only(worker.apply(Command::AddStore { store: taco }));
        assert_eq!(again, Pair::new(ERROR_KEY, "Store already exists."));

        let removed = only(worker.apply(Command::RemoveStore { store: "TacoPlace".into() }));
        assert_eq!(removed.value, "Store TacoPlace removed successfully.");
        let missing = only(worker.apply(Command::RemoveStore { store: "TacoPlace".into() }));
        assert_eq!(missing, Pair::new(ERROR_KEY, "Store TacoPlace not found."));
    }

    #[test]
    fn test_product_commands_feed_deleted_report() {
        let worker = single();
        let pair = only(worker.apply(Command::RemoveProduct {
            store: "CoffeeCorner".into(),
            product: "espresso".into(),
        }));
        assert_eq!(pair.value, "Product espresso removed from store CoffeeCorner.");
        assert_eq!(worker.state.lock().ledger.deleted(), ["espresso".to_string()]);

        let pair = only(worker.apply(Command::DecrementProductAmount {
            store: "PizzaWorld".into(),
            product: "pepperoni".into(),
            amount: 9,
        }));
        assert_eq!(pair.value, "You cannot remove 9 units; only 5 available.");
    }

    #[test]
    fn test_replay_applies_in_order() {
        let worker = single();
        let taco = Store::new("TacoPlace", "mexican", (37.98, 23.72).into());
        worker.state.lock().apply_replay(vec![
            ReplayOp::AddStore(taco.clone()),
            ReplayOp::RemoveStore("SweetTooth".into()),
            ReplayOp::AddStore(taco),
        ]);
        assert!(worker.store("TacoPlace").is_some());
        assert!(worker.store("SweetTooth").is_none());
    }

    #[tokio::test]
    async fn test_map_phase_reports_unreachable_reducer() {
        let reply = single().execute("job-1", Command::ListStores, 1).await;
        assert!(matches!(reply, WorkerReply::Error { .. }));
    }

    #[tokio::test]
    async fn test_standalone_shutdown_is_silent() {
        single().notify_shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_falls_back_to_standalone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pizza.json"),
            r#"{"StoreName":"PizzaWorld","Latitude":37.99,"Longitude":23.73,"FoodCategory":"pizzeria","Stars":4,"NoOfVotes":10,"Products":[]}"#,
        )
        .unwrap();
        let mut settings = settings();
        settings.data_dir = dir.path().to_path_buf();

        let (worker, _listener) = Worker::start(settings).await.unwrap();
        assert_eq!(worker.assignment(), (0, 1));
        assert_eq!(worker.owned_stores(), vec!["PizzaWorld"]);
    }
}
