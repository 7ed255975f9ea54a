//! Async client for the master.

use crate::command::Command;
use crate::error::{ClusterError, Result};
use crate::protocol::{request, MasterReply, MasterRequest};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MasterClient {
    addr: String,
    timeout: Duration,
    token: Option<String>,
}

impl MasterClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            token: None,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sends a raw request; `Error` replies are turned into errors.
    pub async fn call(&self, message: &MasterRequest) -> Result<MasterReply> {
        let reply: MasterReply = request(self.addr.as_str(), message, self.timeout).await?;
        reply.into_result()
    }

    /// Runs a command with the current session token, if any.
    pub async fn send(&self, command: Command) -> Result<MasterReply> {
        tracing::debug!(command = command.name(), master = %self.addr, "Sending command");
        self.call(&MasterRequest::Client {
            command,
            token: self.token.clone(),
        })
        .await
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        let message = MasterRequest::Register {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.call(&message).await? {
            MasterReply::Registered => Ok(()),
            other => Err(ClusterError::Unexpected(format!("{other:?}"))),
        }
    }

    /// Logs in and keeps the session token for later commands.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<String> {
        let message = MasterRequest::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.call(&message).await? {
            MasterReply::LoggedIn { token } => {
                self.token = Some(token.clone());
                Ok(token)
            }
            other => Err(ClusterError::Unexpected(format!("{other:?}"))),
        }
    }
}
