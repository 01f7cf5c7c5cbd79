//! TCP transport: connection lifecycle and response-burst collection.
//!
//! The transport owns at most one live socket. Opening performs the
//! 12-byte handshake exchange; closing sends a best-effort zero-payload
//! QUIT frame. A request is written whole, then the response burst is
//! collected by reading with a short per-read timeout:
//!
//! - reading stops as soon as a terminal (RESULT/FAIL) frame is complete
//!   in the accumulated buffer, so a fast response never waits out an
//!   idle gap;
//! - an idle gap (one per-read timeout with no bytes) ends a burst that
//!   carried no terminal frame;
//! - if no bytes at all arrive within `response_timeout`, the call fails
//!   with `Timeout`.
//!
//! Requests on a closed transport open it lazily first.

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{DfhackError, Result};
use crate::protocol::{quit_frame, BurstScanner, Frame, Handshake, HANDSHAKE_SIZE};

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Connection settings for the transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Server host name or address.
    pub host: String,
    /// Server TCP port.
    pub port: u16,
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Bound on each individual socket read; doubles as the idle gap that
    /// ends a response burst.
    pub read_timeout: Duration,
    /// Bound on total wait while zero response bytes have arrived.
    pub response_timeout: Duration,
    /// Size of the per-read buffer.
    pub buffer_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_millis(100),
            response_timeout: Duration::from_secs(5),
            buffer_size: 8 * 1024,
        }
    }
}

/// TCP transport owning the socket and the handshake.
pub struct Transport {
    config: TransportConfig,
    stream: Option<TcpStream>,
}

impl Transport {
    /// Create a closed transport with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Check if the socket is currently open.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// The transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Open the connection and perform the handshake.
    ///
    /// Calling open on an already-open transport is a no-op. Any socket
    /// error or handshake mismatch surfaces as `Connection`.
    pub async fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            tracing::debug!("connection already open");
            return Ok(());
        }

        let addr = format!("{}:{}", self.config.host, self.config.port);
        tracing::info!(%addr, "opening connection");

        let mut stream = timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| DfhackError::Connection(format!("connect to {addr} timed out")))?
            .map_err(|e| DfhackError::Connection(format!("connect to {addr} failed: {e}")))?;

        stream
            .write_all(&Handshake::request().encode())
            .await
            .map_err(|e| DfhackError::Connection(format!("handshake send failed: {e}")))?;

        let mut buf = [0u8; HANDSHAKE_SIZE];
        timeout(self.config.response_timeout, stream.read_exact(&mut buf))
            .await
            .map_err(|_| DfhackError::Connection("handshake response timed out".to_string()))?
            .map_err(|e| DfhackError::Connection(format!("handshake read failed: {e}")))?;

        Handshake::decode(&buf)
            .map_err(|e| DfhackError::Connection(format!("handshake rejected: {e}")))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Close the connection, sending a zero-payload QUIT frame first.
    ///
    /// Best-effort and idempotent: write errors are ignored and closing an
    /// unopened transport does nothing.
    pub async fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            tracing::debug!("connection already closed");
            return;
        };

        tracing::info!("closing connection");
        if let Err(e) = stream.write_all(&quit_frame()).await {
            tracing::debug!("quit frame write failed: {e}");
        }
        let _ = stream.shutdown().await;
    }

    /// Send a request and collect the full response burst as frames.
    ///
    /// Opens the connection lazily if needed. See the module docs for the
    /// burst-completion rules. A failed call does not close the connection
    /// unless the peer itself hung up.
    pub async fn request(&mut self, request: &[u8]) -> Result<Vec<Frame>> {
        self.open().await?;
        let mut stream = match self.stream.take() {
            Some(s) => s,
            None => return Err(DfhackError::Connection("connection not open".to_string())),
        };

        let result = Self::exchange(&mut stream, &self.config, request).await;
        match result {
            // The peer hung up; the socket is dead, release it.
            Err(DfhackError::Connection(e)) => Err(DfhackError::Connection(e)),
            other => {
                self.stream = Some(stream);
                other
            }
        }
    }

    /// Write the request and read the burst on an open stream.
    async fn exchange(
        stream: &mut TcpStream,
        config: &TransportConfig,
        request: &[u8],
    ) -> Result<Vec<Frame>> {
        stream.write_all(request).await?;

        let mut scanner = BurstScanner::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut buf = vec![0u8; config.buffer_size];
        let mut received = 0usize;
        let start = Instant::now();

        loop {
            match timeout(config.read_timeout, stream.read(&mut buf)).await {
                Ok(Ok(0)) => {
                    if received == 0 {
                        return Err(DfhackError::Connection(
                            "connection closed by server".to_string(),
                        ));
                    }
                    break;
                }
                Ok(Ok(n)) => {
                    received += n;
                    frames.extend(scanner.push(&buf[..n])?);
                    if frames.iter().any(Frame::is_terminal) {
                        break;
                    }
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_elapsed) => {
                    // Idle gap: the only end-of-burst signal when the
                    // server sent no terminal frame.
                    if received > 0 {
                        break;
                    }
                    if start.elapsed() >= config.response_timeout {
                        return Err(DfhackError::Timeout(config.response_timeout));
                    }
                }
            }
        }

        if !scanner.is_empty() {
            return Err(DfhackError::Protocol(format!(
                "response burst ended with {} bytes of a truncated frame",
                scanner.pending()
            )));
        }

        tracing::trace!(frames = frames.len(), bytes = received, "collected burst");
        Ok(frames)
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        // QUIT cannot be sent without an async context; just release the
        // socket. Callers that want a clean teardown use close().
        self.stream = None;
    }
}
