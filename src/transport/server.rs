//! WebSocket server the relay extension connects to.
//!
//! # Connection Flow
//!
//! 1. Rust binds the WebSocket server to the configured address
//! 2. The relay extension connects on browser startup
//! 3. Extension sends READY message with its version and user agent
//! 4. Connection established, ready for commands and events

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::Connection;
use super::connection::{EventStream, ReadyData};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for waiting for the extension to connect.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Accepted
// ============================================================================

/// A connected and handshaken relay extension.
pub struct Accepted {
    /// Command channel to the extension.
    pub connection: Connection,
    /// Events pushed by the extension.
    pub events: EventStream,
    /// READY handshake payload.
    pub ready: ReadyData,
}

// ============================================================================
// PendingServer
// ============================================================================

/// A WebSocket server that is bound but not yet connected.
///
/// # Example
///
/// ```ignore
/// use shot_uploader::transport::PendingServer;
///
/// let server = PendingServer::bind("127.0.0.1:17345".parse()?).await?;
/// println!("Waiting on {}", server.ws_url());
///
/// let accepted = server.accept().await?;
/// ```
pub struct PendingServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Address the server is bound to.
    addr: SocketAddr,
}

impl PendingServer {
    /// Binds a WebSocket server to the given address.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        debug!(port = addr.port(), "WebSocket server bound");

        Ok(Self { listener, addr })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the WebSocket URL for this server.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepts a connection from the extension and completes the handshake.
    ///
    /// The server stays bound, so it can accept again after the extension
    /// reconnects (for instance after a browser restart).
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if `deadline` is set and passes first
    /// - [`Error::Connection`] if WebSocket upgrade fails
    /// - [`Error::ConnectionTimeout`] if READY is not received in time
    pub async fn accept(&self, deadline: Option<Duration>) -> Result<Accepted> {
        let (stream, addr) = match deadline {
            Some(limit) => timeout(limit, self.listener.accept())
                .await
                .map_err(|_| Error::connection_timeout(limit))??,
            None => self.listener.accept().await?,
        };

        debug!(?addr, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        info!(port = self.port(), "WebSocket connection established");

        let (connection, events) = Connection::new(ws_stream);
        let ready = connection.wait_ready().await?;

        Ok(Accepted {
            connection,
            events,
            ready,
        })
    }

    /// Accepts with the default 30s deadline.
    ///
    /// # Errors
    ///
    /// See [`PendingServer::accept`].
    pub async fn accept_default(&self) -> Result<Accepted> {
        self.accept(Some(CONNECTION_TIMEOUT)).await
    }
}

// ============================================================================
// Tests
// ============================================================================
