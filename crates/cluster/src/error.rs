//! Error types for the cluster crate.

use foodshare_core::{Error, ErrorCode};
use foodshare_mapreduce::MapReduceError;
use foodshare_market::MarketError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for cluster operations.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors raised by nodes and clients.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed message: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Frame of {0} bytes exceeds the frame limit")]
    FrameTooLarge(usize),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Unexpected reply: {0}")]
    Unexpected(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("No workers available")]
    NoWorkers,

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Invalid data for {command}: {reason}")]
    InvalidData { command: String, reason: String },

    #[error("{message}")]
    Remote { code: ErrorCode, message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User '{0}' already exists")]
    UserExists(String),

    #[error("Login required")]
    LoginRequired,

    #[error("Credential store {path}: {reason}")]
    CredentialStore { path: String, reason: String },

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Filter(#[from] MapReduceError),
}

impl ClusterError {
    pub fn invalid_data(command: impl Into<String>, reason: impl Into<String>) -> Self {
        ClusterError::InvalidData {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ClusterError::Io(e) => match e.kind() {
                std::io::ErrorKind::ConnectionRefused => ErrorCode::ConnectionRefused,
                std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe => ErrorCode::ConnectionClosed,
                _ => ErrorCode::NetworkError,
            },
            ClusterError::Codec(_) => ErrorCode::ProtocolError,
            ClusterError::FrameTooLarge(_) => ErrorCode::FrameTooLarge,
            ClusterError::ConnectionClosed => ErrorCode::ConnectionClosed,
            ClusterError::Unexpected(_) => ErrorCode::UnexpectedMessage,
            ClusterError::Timeout { .. } => ErrorCode::Timeout,
            ClusterError::NoWorkers => ErrorCode::NoWorkers,
            ClusterError::UnknownCommand(_) => ErrorCode::UnknownCommand,
            ClusterError::InvalidData { .. } => ErrorCode::InvalidInput,
            ClusterError::Remote { code, .. } => *code,
            ClusterError::InvalidCredentials | ClusterError::LoginRequired => {
                ErrorCode::InvalidCredentials
            }
            ClusterError::UserExists(_) => ErrorCode::UserExists,
            ClusterError::CredentialStore { .. } => ErrorCode::IoError,
            ClusterError::Market(e) => e.code(),
            ClusterError::Filter(e) => e.code(),
        }
    }

    /// True for failures of the link rather than of the request.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClusterError::Io(_)
                | ClusterError::ConnectionClosed
                | ClusterError::Timeout { .. }
                | ClusterError::Codec(_)
                | ClusterError::FrameTooLarge(_)
        )
    }
}

const START_NODES: &str = "Check that the master, reducer and at least one worker are running";

impl From<ClusterError> for Error {
    fn from(err: ClusterError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            ClusterError::NoWorkers => Error::no_workers(),
            ClusterError::Remote {
                code: ErrorCode::NoWorkers,
                ..
            } => Error::no_workers().with_context(message),
            ClusterError::Timeout { operation, .. } => Error::timeout(operation).with_context(message),
            ClusterError::InvalidCredentials => {
                Error::invalid_credentials().with_suggestion("Log in again or register a new account")
            }
            ClusterError::UserExists(username) => Error::user_exists(&username),
            ClusterError::Market(MarketError::StoreNotFound(store)) => Error::store_not_found(&store),
            ClusterError::Codec(e) => Error::protocol(message).with_source(e),
            ClusterError::CredentialStore { .. } => Error::io(message),
            ClusterError::Io(e) => match code {
                ErrorCode::NetworkError => Error::network(message).with_source(e),
                _ => Error::new(code, message).with_source(e).with_suggestion(START_NODES),
            },
            _ if code == ErrorCode::InvalidCredentials => {
                Error::new(code, message).with_suggestion("Log in again or register a new account")
            }
            _ => Error::new(code, message),
        }
    }
}
