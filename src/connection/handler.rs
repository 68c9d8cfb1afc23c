//! Per-Connection Handler
//!
//! Runs the read-execute-respond loop for one client. TCP is a stream, so
//! a read may deliver half a line or several lines at once; incoming bytes
//! land in a `BytesMut` buffer and complete lines are peeled off as they
//! become available.
//!
//! Connection lifetime:
//!
//! 1. client connects, handler task is spawned
//! 2. loop: take complete lines from the buffer, execute, reply
//! 3. read more bytes when the buffer has no complete line
//! 4. client disconnects (read of 0 bytes) or errors; task ends

use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use crate::commands::CommandHandler;

/// A single request line may not grow beyond this (64 KB).
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Starting capacity of the inbound buffer.
const READ_BUFFER_CAPACITY: usize = 4096;

/// Aggregate counters over every client session, shared server-wide.
///
/// Counters are relaxed atomics: they feed logs and diagnostics, nothing
/// that needs cross-field consistency.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Sessions accepted since startup.
    pub accepted: AtomicU64,
    /// Sessions currently open.
    pub open: AtomicU64,
    /// Request lines executed.
    pub lines_executed: AtomicU64,
    /// Bytes received from clients.
    pub inbound_bytes: AtomicU64,
    /// Bytes sent back to clients.
    pub outbound_bytes: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn session_started(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.open.fetch_add(1, Ordering::Relaxed);
    }

    fn session_ended(&self) {
        self.open.fetch_sub(1, Ordering::Relaxed);
    }

    fn record_line(&self) {
        self.lines_executed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_inbound(&self, bytes: usize) {
        self.inbound_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn record_outbound(&self, bytes: usize) {
        self.outbound_bytes
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }
}

/// Errors that can end a session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Network failure underneath the session.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection cleanly.
    #[error("connection closed by peer")]
    Closed,

    /// The stream ended in the middle of a request line.
    #[error("connection closed mid-line")]
    TruncatedLine,

    /// One request line outgrew the read limit.
    #[error("request line exceeds the read limit")]
    LineTooLong,
}

/// State for one client session.
pub struct ConnectionHandler {
    socket: BufWriter<TcpStream>,
    addr: SocketAddr,
    inbound: BytesMut,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        commands: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.session_started();

        Self {
            socket: BufWriter::new(socket),
            addr,
            inbound: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            commands,
            stats,
        }
    }

    /// Drives the session until the peer hangs up or something breaks.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        debug!(peer = %self.addr, "Session opened");

        let outcome = self.serve().await;
        self.stats.session_ended();

        match &outcome {
            Ok(()) | Err(ConnectionError::Closed) => {
                debug!(peer = %self.addr, "Session closed");
            }
            Err(ConnectionError::Io(e))
                if e.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(peer = %self.addr, "Peer reset the connection");
            }
            Err(e) => {
                warn!(peer = %self.addr, error = %e, "Session ended abnormally");
            }
        }
        outcome
    }

    /// The read-execute-respond loop. Complete lines are drained from the
    /// inbound buffer first; only then does the socket get polled for more
    /// bytes, so pipelined commands in one packet are all served before
    /// the next read.
    async fn serve(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(line) = self.take_line() {
                trace!(peer = %self.addr, line = %line, "Executing");
                let response = self.commands.execute(&line);
                self.stats.record_line();
                self.reply(&response).await?;
            }

            // No complete line buffered. Refuse to buffer without bound.
            if self.inbound.len() >= MAX_LINE_BYTES {
                warn!(
                    peer = %self.addr,
                    buffered = self.inbound.len(),
                    "Dropping session, request line too long"
                );
                return Err(ConnectionError::LineTooLong);
            }

            let n = self.socket.get_mut().read_buf(&mut self.inbound).await?;
            if n == 0 {
                // EOF. Leftover bytes mean the peer died mid-line.
                return Err(if self.inbound.is_empty() {
                    ConnectionError::Closed
                } else {
                    ConnectionError::TruncatedLine
                });
            }
            self.stats.record_inbound(n);
        }
    }

    /// Splits one complete line off the buffer, if present. The line comes
    /// back without its terminator; a bare newline survives as an empty
    /// line and gets the usual invalid-command reply.
    fn take_line(&mut self) -> Option<String> {
        let newline = self.inbound.iter().position(|&b| b == b'\n')?;
        let line = self.inbound.split_to(newline + 1);
        let text = String::from_utf8_lossy(&line);
        Some(text.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn reply(&mut self, response: &str) -> Result<(), ConnectionError> {
        self.socket.write_all(response.as_bytes()).await?;
        self.socket.flush().await?;
        self.stats.record_outbound(response.len());
        Ok(())
    }
}

/// Entry point for the accept loop: run one session to completion.
/// Every ending, ordinary or not, is already logged inside [`run`].
///
/// [`run`]: ConnectionHandler::run
pub async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    let session = ConnectionHandler::new(socket, addr, commands, stats);
    let _ = session.run().await;
}
