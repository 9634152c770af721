//! WebSocket protocol message types.
//!
//! This module defines the message format for communication between
//! local end (Rust controller) and remote end (relay extension).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response |
//! | `Event` | Remote → Local | Browser or UI notification |
//! | `EventReply` | Local → Remote | Answer to a UI message |
//!
//! # Command Naming
//!
//! Commands follow `module.methodName` format:
//!
//! - `tabs.query`
//! - `windows.update`
//! - `scripting.executeScript`

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by module.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, ScriptingCommand, TabsCommand, WindowsCommand};
pub use event::{Event, EventReply, ParsedEvent};
pub use request::{Request, Response, ResponseType};
