//! Foodshare node - runs one role of the market cluster
//!
//! Start a master, a reducer and any number of workers; workers join the
//! master on startup and leave on Ctrl-C or a `SHUTDOWN` line on stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foodshare_cli::output::Status;
use foodshare_cluster::{
    ClusterError, CredentialStore, Master, MasterSettings, ReduceServer, ReducerSettings, Worker,
    WorkerSettings,
};
use foodshare_core::config::{Config, ConfigSchema};
use foodshare_core::error::exit_codes;
use foodshare_telemetry::{metrics, TelemetryConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "foodshare-node")]
#[command(author, version, about = "Run a Foodshare market cluster node", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to foodshare-market.toml in standard locations)
    #[arg(short, long, global = true, env = "FOODSHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Role,
}

#[derive(Subcommand)]
enum Role {
    /// Accept console requests and route them to workers
    Master {
        /// Listen address
        #[arg(long, env = "FOODSHARE_MASTER_BIND")]
        bind: Option<String>,

        /// Credential file
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Reject commands from consoles that have not logged in
        #[arg(long)]
        require_login: bool,
    },

    /// Serve a partition of the store catalogue
    Worker {
        /// Command listener address
        #[arg(long, env = "FOODSHARE_WORKER_BIND")]
        bind: Option<String>,

        /// Master address
        #[arg(long, env = "FOODSHARE_MASTER_ADDR")]
        master: Option<String>,

        /// Reducer address
        #[arg(long, env = "FOODSHARE_REDUCER_ADDR")]
        reducer: Option<String>,

        /// Directory of store JSON files
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Merge mapping output and return results to the master
    Reducer {
        /// Listen address
        #[arg(long, env = "FOODSHARE_REDUCER_BIND")]
        bind: Option<String>,

        /// Master address
        #[arg(long, env = "FOODSHARE_MASTER_ADDR")]
        master: Option<String>,
    },
}

impl Role {
    fn name(&self) -> &'static str {
        match self {
            Role::Master { .. } => "master",
            Role::Worker { .. } => "worker",
            Role::Reducer { .. } => "reducer",
        }
    }

    /// Folds command-line overrides into the loaded configuration.
    fn apply(self, schema: &mut ConfigSchema) {
        match self {
            Role::Master {
                bind,
                credentials,
                require_login,
            } => {
                if let Some(bind) = bind {
                    schema.master.bind = bind;
                }
                if let Some(path) = credentials {
                    schema.master.credentials_path = path;
                }
                schema.master.require_login |= require_login;
            }
            Role::Worker {
                bind,
                master,
                reducer,
                data_dir,
            } => {
                if let Some(bind) = bind {
                    schema.worker.bind = bind;
                }
                if let Some(master) = master {
                    schema.worker.master_addr = master;
                }
                if let Some(reducer) = reducer {
                    schema.worker.reducer_addr = reducer;
                }
                if let Some(dir) = data_dir {
                    schema.worker.data_dir = dir;
                }
            }
            Role::Reducer { bind, master } => {
                if let Some(bind) = bind {
                    schema.reducer.bind = bind;
                }
                if let Some(master) = master {
                    schema.reducer.master_addr = master;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Status::error(&format!("{e:#}"));
            let code = e
                .downcast_ref::<ClusterError>()
                .map(|err| exit_codes::for_code(err.code()))
                .unwrap_or(exit_codes::FAILURE);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let role = cli.command.name();
    cli.command.apply(&mut config.schema);
    let schema = config.schema;

    let telemetry = TelemetryConfig::from_logging(format!("foodshare-{role}"), &schema.logging)
        .with_verbosity(cli.verbose);
    let _guard = foodshare_telemetry::init_with_config(telemetry)?;
    if let Some(path) = &config.path {
        tracing::info!(path = %path.display(), "Loaded configuration");
    }

    match role {
        "master" => run_master(&schema).await?,
        "worker" => run_worker(&schema).await?,
        _ => run_reducer(&schema).await?,
    }

    tracing::debug!(metrics = %metrics().export_json(), "Final metrics");
    Ok(())
}

async fn run_master(schema: &ConfigSchema) -> Result<()> {
    let credentials = CredentialStore::open(&schema.master.credentials_path)?;
    let master = Arc::new(Master::new(MasterSettings::from(&schema.master), credentials));
    let listener = bind(&schema.master.bind).await?;
    master.serve(listener, shutdown_signal()).await?;
    Ok(())
}

async fn run_worker(schema: &ConfigSchema) -> Result<()> {
    let (worker, listener) = Worker::start(WorkerSettings::from(&schema.worker))
        .await
        .context("Failed to start worker")?;
    Arc::clone(&worker).serve(listener, shutdown_signal()).await?;

    if let Err(e) = worker.notify_shutdown().await {
        tracing::warn!(error = %e, "Could not notify master of shutdown");
    }
    Ok(())
}

async fn run_reducer(schema: &ConfigSchema) -> Result<()> {
    let server = Arc::new(ReduceServer::new(ReducerSettings::from(&schema.reducer)));
    let listener = bind(&schema.reducer.bind).await?;
    server.serve(listener, shutdown_signal()).await?;
    Ok(())
}

async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))
}

/// Resolves on Ctrl-C or a `SHUTDOWN` line on stdin.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    let stdin = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().eq_ignore_ascii_case("SHUTDOWN") => return,
                Ok(Some(_)) => {}
                // A closed stdin (daemonised node) leaves only Ctrl-C
                Ok(None) | Err(_) => std::future::pending::<()>().await,
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = stdin => {}
    }
    tracing::info!("Shutdown requested");
}
