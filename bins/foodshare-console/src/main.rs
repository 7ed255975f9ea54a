//! Foodshare console - customer and manager front ends for the market
//!
//! Talks to the master only; every command goes through the cluster.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foodshare_cli::output::Status;
use foodshare_cluster::{ClusterError, Command, MasterClient};
use foodshare_core::config::Config;
use foodshare_core::error::exit_codes;
use foodshare_geo::Coordinate;
use foodshare_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod customer;
mod manager;
mod prompt;
mod render;

use prompt::Prompt;

#[derive(Parser)]
#[command(name = "foodshare-console")]
#[command(author, version, about = "Shop and manage stores on the Foodshare market", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to foodshare-market.toml in standard locations)
    #[arg(short, long, global = true, env = "FOODSHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Master address
    #[arg(short, long, global = true, env = "FOODSHARE_MASTER_ADDR")]
    master: Option<String>,

    /// Log in as this user before running the command
    #[arg(short, long, global = true, env = "FOODSHARE_USER")]
    user: Option<String>,

    /// Password for --user (prompted when omitted)
    #[arg(long, global = true, env = "FOODSHARE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search stores, buy products and leave reviews
    Customer {
        /// Your latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Your longitude
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Search radius in kilometers
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Maintain stores and products and view reports
    Manager,

    /// Create an account
    Register {
        /// Account name
        username: String,
    },

    /// Check credentials and print a session token
    Login {
        /// Account name
        username: String,
    },

    /// Send one command in text form, e.g. `send SEARCH FoodCategory=pizzeria`
    Send {
        /// Command name such as PURCHASE_PRODUCT or LIST_STORES
        name: String,

        /// Command data, fields separated by '|'
        #[arg(default_value = "")]
        data: String,
    },
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
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let settings = config.schema.client;

    let mut telemetry = TelemetryConfig::from_logging("foodshare-console", &config.schema.logging)
        .with_verbosity(cli.verbose);
    if cli.verbose == 0 {
        // Keep menus readable
        telemetry.log_level = "warn".to_string();
    }
    let _guard = foodshare_telemetry::init_with_config(telemetry)?;

    let addr = cli.master.unwrap_or_else(|| settings.master_addr.clone());
    let mut client = MasterClient::new(addr, settings.timeout());
    let mut prompt = Prompt::new();

    match cli.command {
        Commands::Register { username } => {
            let password = password(cli.password, &mut prompt).await?;
            client.register(&username, &password).await?;
            Status::success(&format!("Account {username} registered."));
            return Ok(());
        }
        Commands::Login { username } => {
            let password = password(cli.password, &mut prompt).await?;
            let token = client.login(&username, &password).await?;
            Status::success(&format!("Logged in as {username}."));
            println!("{token}");
            return Ok(());
        }
        _ => {}
    }

    if let Some(username) = &cli.user {
        let password = password(cli.password, &mut prompt).await?;
        client.login(username, &password).await?;
        tracing::debug!(username = %username, "Logged in");
    }

    match cli.command {
        Commands::Customer { lat, lon, radius } => {
            let location = Coordinate::try_new(
                lat.unwrap_or(settings.latitude),
                lon.unwrap_or(settings.longitude),
            )
            .context("Invalid customer location")?;
            let options = customer::CustomerOptions {
                location,
                radius_km: radius.unwrap_or(settings.radius_km),
            };
            customer::run(&client, &mut prompt, options).await
        }
        Commands::Manager => manager::run(&client, &mut prompt).await,
        Commands::Send { name, data } => {
            let command = Command::parse_legacy(&name, &data)?;
            let reply = client.send(command).await?;
            render::show(&reply);
            Ok(())
        }
        Commands::Register { .. } | Commands::Login { .. } => Ok(()),
    }
}

async fn password(given: Option<String>, prompt: &mut Prompt) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => prompt
            .ask("Password:")
            .await?
            .context("No password given"),
    }
}
