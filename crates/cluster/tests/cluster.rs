//! End-to-end tests: a master, a reducer and workers on localhost.

use foodshare_cluster::protocol::ERROR_KEY;
use foodshare_cluster::{
    Command, CredentialStore, Master, MasterClient, MasterReply, MasterSettings, ReduceServer,
    ReducerSettings, Worker, WorkerSettings,
};
use foodshare_core::ErrorCode;
use foodshare_mapreduce::{SearchFilter, LIST_STORES_KEY};
use foodshare_market::{Product, Store};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const TIMEOUT: Duration = Duration::from_secs(5);

fn catalogue() -> Vec<Store> {
    vec![
        Store::new("PizzaWorld", "pizzeria", (37.9932963, 23.733413).into()).with_products(vec![
            Product::new("pepperoni", "pizza", 10, 12.0),
            Product::new("margherita", "pizza", 10, 9.0),
        ]),
        Store::new("CoffeeCorner", "coffee", (37.9838, 23.7275).into())
            .with_products(vec![Product::new("espresso", "coffee", 40, 2.5)]),
        Store::new("SeaFoodExpress", "seafood", (40.6401, 22.9444).into())
            .with_products(vec![Product::new("lobster", "seafood", 4, 35.0)]),
        Store::new("SweetTooth", "desserts", (37.97, 23.73).into())
            .with_products(vec![Product::new("pepperoni", "cookie", 3, 2.0)]),
    ]
}

struct TestCluster {
    master: Arc<Master>,
    master_addr: SocketAddr,
    reducer_addr: SocketAddr,
    data: TempDir,
    workers: Vec<(Arc<Worker>, JoinHandle<()>)>,
}

impl TestCluster {
    async fn start(workers: usize) -> Self {
        Self::start_with(workers, Duration::from_secs(2)).await
    }

    async fn start_with(workers: usize, worker_wait: Duration) -> Self {
        let data = tempfile::tempdir().unwrap();
        for store in catalogue() {
            let path = data.path().join(format!("{}.json", store.name));
            std::fs::write(path, store.to_json().unwrap()).unwrap();
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let master_addr = listener.local_addr().unwrap();
        let master = Arc::new(Master::new(
            MasterSettings {
                worker_wait,
                reduce_timeout: TIMEOUT,
                worker_io_timeout: Duration::from_secs(2),
                require_login: false,
                session_ttl: Duration::from_secs(60),
            },
            CredentialStore::in_memory(),
        ));
        tokio::spawn(Arc::clone(&master).serve(listener, std::future::pending()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let reducer_addr = listener.local_addr().unwrap();
        let reducer = Arc::new(ReduceServer::new(ReducerSettings {
            bind: reducer_addr.to_string(),
            master_addr: master_addr.to_string(),
            job_ttl: Duration::from_secs(60),
            io_timeout: Duration::from_secs(2),
        }));
        tokio::spawn(reducer.serve(listener, std::future::pending()));

        let mut cluster = Self {
            master,
            master_addr,
            reducer_addr,
            data,
            workers: Vec::new(),
        };
        for _ in 0..workers {
            cluster.add_worker().await;
        }
        cluster.settle().await;
        cluster
    }

    fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            bind: "127.0.0.1:0".into(),
            master_addr: self.master_addr.to_string(),
            reducer_addr: self.reducer_addr.to_string(),
            data_dir: self.data.path().to_path_buf(),
            handshake_attempts: 3,
            io_timeout: Duration::from_secs(2),
        }
    }

    async fn add_worker(&mut self) -> Arc<Worker> {
        let (worker, listener) = Worker::start(self.worker_settings()).await.unwrap();
        self.serve_worker(Arc::clone(&worker), listener);
        worker
    }

    fn serve_worker(&mut self, worker: Arc<Worker>, listener: TcpListener) {
        let handle = tokio::spawn({
            let worker = Arc::clone(&worker);
            async move {
                let _ = worker.serve(listener, std::future::pending()).await;
            }
        });
        self.workers.push((worker, handle));
    }

    /// Waits until every live worker holds the master's current layout.
    async fn settle(&self) {
        tokio::time::timeout(TIMEOUT, async {
            loop {
                let (total, epoch) = (self.master.worker_count(), self.master.epoch());
                let mut ids: Vec<usize> = Vec::new();
                let settled = self
                    .workers
                    .iter()
                    .filter(|(_, handle)| !handle.is_finished())
                    .all(|(worker, _)| {
                        let (id, seen) = worker.assignment();
                        ids.push(id);
                        seen == total && worker.epoch() == epoch
                    });
                ids.sort_unstable();
                ids.dedup();
                if settled && ids.len() == total {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("workers did not settle");
    }

    fn client(&self) -> MasterClient {
        MasterClient::new(self.master_addr.to_string(), TIMEOUT)
    }
}

async fn reduced(client: &MasterClient, command: Command) -> BTreeMap<String, String> {
    match client.send(command).await.unwrap() {
        MasterReply::Reduced { result } => result,
        other => panic!("expected reduced result, got {other:?}"),
    }
}

async fn pairs(client: &MasterClient, command: Command) -> Vec<(String, String)> {
    match client.send(command).await.unwrap() {
        MasterReply::Pairs { pairs } => pairs.into_iter().map(|p| (p.key, p.value)).collect(),
        other => panic!("expected pairs, got {other:?}"),
    }
}

fn sorted_list(joined: &str) -> Vec<String> {
    let mut names: Vec<String> = joined.split(", ").map(str::to_string).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_list_stores_covers_every_partition() {
    let cluster = TestCluster::start(2).await;
    let result = reduced(&cluster.client(), Command::ListStores).await;

    assert_eq!(
        sorted_list(&result[LIST_STORES_KEY]),
        vec!["CoffeeCorner", "PizzaWorld", "SeaFoodExpress", "SweetTooth"]
    );
}

#[tokio::test]
async fn test_concurrent_joins_converge_on_latest_layout() {
    let mut cluster = TestCluster::start(0).await;

    let mut joins = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let settings = cluster.worker_settings();
        joins.spawn(async move { Worker::start(settings).await.unwrap() });
    }
    while let Some(joined) = joins.join_next().await {
        let (worker, listener) = joined.unwrap();
        cluster.serve_worker(worker, listener);
    }

    cluster.settle().await;
    assert_eq!(cluster.master.worker_count(), 4);
    assert_eq!(cluster.master.epoch(), 4);

    let result = reduced(&cluster.client(), Command::ListStores).await;
    assert_eq!(sorted_list(&result[LIST_STORES_KEY]).len(), 4);
}

#[tokio::test]
async fn test_search_returns_store_documents() {
    let cluster = TestCluster::start(3).await;
    let result = reduced(
        &cluster.client(),
        Command::Search {
            filter: SearchFilter::FoodCategory {
                category: "Pizzeria".into(),
            },
        },
    )
    .await;

    assert_eq!(result.keys().collect::<Vec<_>>(), vec!["PizzaWorld"]);
    let store: serde_json::Value = serde_json::from_str(&result["PizzaWorld"]).unwrap();
    assert_eq!(store["FoodCategory"], "pizzeria");
    assert_eq!(store["AveragePriceSymbol"], "$$");
}

#[tokio::test]
async fn test_purchase_then_aggregate_sales() {
    let cluster = TestCluster::start(2).await;
    let client = cluster.client();

    let reply = pairs(
        &client,
        Command::PurchaseProduct {
            store: "PizzaWorld".into(),
            product: "pepperoni".into(),
            quantity: 2,
        },
    )
    .await;
    assert_eq!(
        reply,
        vec![(
            "PizzaWorld".to_string(),
            "Successfully purchased 2 of pepperoni from store PizzaWorld.|8".to_string()
        )]
    );

    let sales = reduced(
        &client,
        Command::AggregateSales {
            product: "pepperoni".into(),
        },
    )
    .await;
    assert_eq!(sales["PizzaWorld"], "2");
    assert_eq!(sales["SweetTooth"], "0");
    assert_eq!(sales.len(), 4);
}

#[tokio::test]
async fn test_failed_purchase_and_unknown_store() {
    let cluster = TestCluster::start(2).await;
    let client = cluster.client();

    let reply = pairs(
        &client,
        Command::PurchaseProduct {
            store: "SeaFoodExpress".into(),
            product: "lobster".into(),
            quantity: 99,
        },
    )
    .await;
    assert_eq!(reply[0].0, ERROR_KEY);

    let reply = pairs(
        &client,
        Command::Review {
            store: "PizzaWorl".into(),
            stars: 5,
        },
    )
    .await;
    assert_eq!(reply[0].0, ERROR_KEY);
    assert!(reply[0].1.contains("Did you mean PizzaWorld?"));
}

#[tokio::test]
async fn test_late_joiner_receives_catalogue_changes() {
    let mut cluster = TestCluster::start(1).await;
    let client = cluster.client();

    let taco = Store::new("TacoPlace", "mexican", (37.98, 23.72).into());
    let reply = pairs(&client, Command::AddStore { store: taco.clone() }).await;
    assert_eq!(reply[0].1, "Store TacoPlace added successfully.");

    let reply = pairs(&client, Command::AddStore { store: taco }).await;
    assert_eq!(reply[0], (ERROR_KEY.to_string(), "Store already exists.".to_string()));

    pairs(&client, Command::RemoveStore { store: "SweetTooth".into() }).await;
    assert_eq!(cluster.master.replay_log().len(), 2);

    let late = cluster.add_worker().await;
    cluster.settle().await;
    assert!(late.store("TacoPlace").is_some());
    assert!(late.store("SweetTooth").is_none());

    let result = reduced(&client, Command::ListStores).await;
    assert_eq!(
        sorted_list(&result[LIST_STORES_KEY]),
        vec!["CoffeeCorner", "PizzaWorld", "SeaFoodExpress", "TacoPlace"]
    );
}

#[tokio::test]
async fn test_worker_shutdown_shifts_ids() {
    let cluster = TestCluster::start(3).await;
    let (first, handle) = &cluster.workers[0];

    first.notify_shutdown().await.unwrap();
    handle.abort();
    assert_eq!(cluster.master.worker_count(), 2);

    tokio::time::timeout(TIMEOUT, async {
        loop {
            let layout: Vec<_> = cluster.workers[1..].iter().map(|(w, _)| w.assignment()).collect();
            if layout == vec![(0, 2), (1, 2)] {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("survivors were not reassigned");

    let result = reduced(&cluster.client(), Command::ListStores).await;
    assert_eq!(sorted_list(&result[LIST_STORES_KEY]).len(), 4);
}

#[tokio::test]
async fn test_directed_command_fails_over_to_replica() {
    let cluster = TestCluster::start(2).await;
    // With two workers PizzaWorld belongs to worker 0 and is replicated on worker 1
    let (_, handle) = &cluster.workers[0];
    handle.abort();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let reply = pairs(
        &cluster.client(),
        Command::Review {
            store: "PizzaWorld".into(),
            stars: 4,
        },
    )
    .await;
    assert_eq!(
        reply,
        vec![("PizzaWorld".to_string(), "Gave **** Stars Review for: PizzaWorld".to_string())]
    );
}

#[tokio::test]
async fn test_register_and_login() {
    let cluster = TestCluster::start(1).await;
    let mut client = cluster.client();

    client.register("eleni", "souvlaki").await.unwrap();
    let err = client.register("eleni", "other").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserExists);

    let err = client.login("eleni", "wrong").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidCredentials);

    let token = client.login("eleni", "souvlaki").await.unwrap();
    assert_eq!(client.token(), Some(token.as_str()));
    assert!(client.send(Command::ListStores).await.is_ok());
}

#[tokio::test]
async fn test_no_workers_reply() {
    let cluster = TestCluster::start_with(0, Duration::from_millis(100)).await;
    let err = cluster.client().send(Command::ListStores).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoWorkers);
}
