//! Wire messages and line framing.
//!
//! Every message is one JSON document followed by `\n`. A connection may carry
//! any number of request/reply exchanges.

use crate::command::Command;
use crate::error::{ClusterError, Result};
use foodshare_core::ErrorCode;
use foodshare_mapreduce::Pair;
use foodshare_market::Store;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Largest accepted line, newline excluded.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Pair key a worker uses to report a failed directed or catalogue command.
pub const ERROR_KEY: &str = "ERROR";

/// Anything sent to the master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MasterRequest {
    Client {
        command: Command,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Register {
        username: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    WorkerHandshake {
        port: u16,
    },
    WorkerShutdown {
        id: usize,
    },
    ReduceResult {
        job_id: String,
        command: String,
        result: BTreeMap<String, String>,
    },
}

/// The master's answer to any request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MasterReply {
    /// Pairs returned by the worker that handled a directed or catalogue command
    Pairs { pairs: Vec<Pair> },
    /// Output of the reduce server
    Reduced { result: BTreeMap<String, String> },
    Registered,
    LoggedIn { token: String },
    Assigned {
        id: usize,
        total: usize,
        epoch: u64,
        replay: Vec<ReplayOp>,
    },
    Ack,
    Error { code: ErrorCode, message: String },
}

impl MasterReply {
    pub fn error(err: &ClusterError) -> Self {
        MasterReply::Error {
            code: err.code(),
            message: err.to_string(),
        }
    }

    /// Turns an `Error` reply back into an error value.
    pub fn into_result(self) -> Result<Self> {
        match self {
            MasterReply::Error { code, message } => Err(ClusterError::Remote { code, message }),
            other => Ok(other),
        }
    }
}

/// Catalogue change recorded by the master and replayed to late joiners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum ReplayOp {
    AddStore(Store),
    RemoveStore(String),
}

/// Master to worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    Execute {
        job_id: String,
        command: Command,
        /// Number of partials the reducer should wait for
        expected_partials: usize,
    },
    /// Layout unchanged for this worker apart from the count
    Reload {
        id: usize,
        total: usize,
        /// Layout version; workers drop anything older than what they hold
        epoch: u64,
    },
    /// This worker's id moved after a departure
    Reassign {
        id: usize,
        total: usize,
        epoch: u64,
    },
}

/// Worker to master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerReply {
    Pairs { pairs: Vec<Pair> },
    MappingSent,
    Reloaded,
    Error { message: String },
}

/// Worker to reduce server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReducerRequest {
    Partial {
        job_id: String,
        command: String,
        expected: usize,
        pairs: Vec<Pair>,
    },
}

/// Reduce server to worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReducerReply {
    Ack,
    Error { message: String },
}

/// A framed JSON-lines connection.
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    peer: Option<SocketAddr>,
    buf: Vec<u8>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        let (read, write) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer: BufWriter::new(write),
            peer,
            buf: Vec::new(),
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let mut line = serde_json::to_vec(message)?;
        if line.len() > MAX_FRAME_BYTES {
            return Err(ClusterError::FrameTooLarge(line.len()));
        }
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Reads the next message; `None` once the peer has closed the connection.
    ///
    /// Blank lines are skipped.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            self.buf.clear();
            let limit = (MAX_FRAME_BYTES + 1) as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buf)
                .await?;
            if read == 0 {
                return Ok(None);
            }
            if self.buf.last() != Some(&b'\n') && self.buf.len() > MAX_FRAME_BYTES {
                return Err(ClusterError::FrameTooLarge(self.buf.len()));
            }
            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_slice(line)?));
        }
    }

    /// Reads the next message, treating end of stream as an error.
    pub async fn expect<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.recv().await?.ok_or(ClusterError::ConnectionClosed)
    }
}

/// Connects, sends one request and waits for one reply, all within `timeout`.
pub async fn request<A, Req, Resp>(addr: A, message: &Req, timeout: Duration) -> Result<Resp>
where
    A: ToSocketAddrs,
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let exchange = async {
        let mut conn = Connection::connect(addr).await?;
        conn.send(message).await?;
        conn.expect::<Resp>().await
    };
    tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| ClusterError::Timeout {
            operation: "request",
            after: timeout,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (Connection, Connection) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(Connection::connect(addr), listener.accept());
        (client.unwrap(), Connection::new(accepted.unwrap().0))
    }

    #[tokio::test]
    async fn test_send_and_recv() {
        let (mut client, mut server) = pair().await;

        client
            .send(&MasterRequest::Client {
                command: Command::ListStores,
                token: None,
            })
            .await
            .unwrap();
        let received: MasterRequest = server.expect().await.unwrap();
        assert_eq!(
            received,
            MasterRequest::Client {
                command: Command::ListStores,
                token: None
            }
        );
    }

    #[tokio::test]
    async fn test_recv_none_on_close() {
        let (client, mut server) = pair().await;
        drop(client);
        let received: Option<MasterRequest> = server.recv().await.unwrap();
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (client, mut server) = pair().await;
        let mut raw = client.writer;
        let writer = tokio::spawn(async move {
            let big = vec![b'a'; MAX_FRAME_BYTES + 10];
            raw.write_all(&big).await.unwrap();
            raw.flush().await.unwrap();
            raw
        });

        let err = server.recv::<MasterRequest>().await.unwrap_err();
        assert!(matches!(err, ClusterError::FrameTooLarge(_)));
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (client, mut server) = pair().await;
        let mut raw = client.writer;
        raw.write_all(b"\n{not json}\n").await.unwrap();
        raw.flush().await.unwrap();

        let err = server.recv::<MasterRequest>().await.unwrap_err();
        assert!(matches!(err, ClusterError::Codec(_)));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept but never answer
        let _hold = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = request::<_, _, MasterReply>(addr, &MasterRequest::WorkerShutdown { id: 0 }, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::Timeout { .. }));
    }

    #[test]
    fn test_wire_shapes() {
        let json = serde_json::to_value(ReplayOp::RemoveStore("TacoPlace".into())).unwrap();
        assert_eq!(json, serde_json::json!({"op": "remove_store", "data": "TacoPlace"}));

        let json = serde_json::to_value(MasterReply::Error {
            code: ErrorCode::NoWorkers,
            message: "No workers available".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "NO_WORKERS");
    }

    #[test]
    fn test_into_result() {
        let err = MasterReply::error(&ClusterError::NoWorkers).into_result().unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoWorkers);
        assert!(MasterReply::Ack.into_result().is_ok());
    }
}
