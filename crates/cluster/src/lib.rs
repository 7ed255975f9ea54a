//! Master, worker and reduce nodes of the Foodshare market.
//!
//! All nodes speak newline-delimited JSON over TCP (see [`protocol`]):
//!
//! - [`Master`] accepts console requests, tracks workers and routes commands
//! - [`Worker`] holds the catalogue and serves its partition of the stores
//! - [`ReduceServer`] merges the workers' mapping output per job
//! - [`MasterClient`] is what the consoles use to talk to the master

pub mod auth;
pub mod client;
pub mod command;
mod error;
pub mod master;
pub mod pending;
pub mod protocol;
pub mod reducer;
pub mod worker;

pub use auth::{CredentialStore, Sessions};
pub use client::MasterClient;
pub use command::{Command, Routing};
pub use error::{ClusterError, Result};
pub use master::{Assignment, Master, MasterSettings};
pub use protocol::{Connection, MasterReply, MasterRequest, ReplayOp};
pub use reducer::{Completed, ReduceServer, ReducerSettings};
pub use worker::{Worker, WorkerSettings};
