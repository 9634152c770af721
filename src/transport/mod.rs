//! WebSocket transport layer.
//!
//! This module handles communication between local end (Rust controller) and
//! remote end (relay extension) via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │ Controller (Rust)│                              │ Relay extension │
//! │                  │         WebSocket            │  (background)   │
//! │  PendingServer   │◄────────────────────────────►│                 │
//! │  → Connection    │      localhost:PORT          │  WebSocket      │
//! │                  │                              │  client         │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `PendingServer::bind` - Bind to the configured address
//! 2. `PendingServer::accept` - Wait for the extension and its READY message
//! 3. `Connection` - Send commands, receive responses/events
//! 4. `Connection::shutdown` - Close connection

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// WebSocket server binding and acceptance.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventStream, ReadyData};
pub use server::{Accepted, PendingServer};
