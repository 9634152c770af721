//! shot-uploader - capture the visible browser tab and upload it into a chat
//! web app.
//!
//! This crate is the background controller of a screenshot-upload browser
//! extension. A thin relay extension executes browser calls and forwards
//! browser events over a local WebSocket; everything else happens here.
//!
//! # Architecture
//!
//! - **Local End (Rust)**: Resolves tabs, navigates folders, picks DOM
//!   strategies, persists preferences, answers popup messages
//! - **Remote End (relay extension)**: Runs `tabs`, `windows` and `scripting`
//!   calls, emits `tabs.removed`, `commands.command` and `runtime.message`
//!
//! Page heuristics are split in two: probe scripts return plain JSON
//! snapshots of the page, and named strategies in Rust choose from them.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shot_uploader::{Config, JsonFileStore, Result, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();
//!     let store = JsonFileStore::new(config.resolve_store_path()?);
//!
//!     serve(Arc::new(config), Arc::new(store)).await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | [`Browser`] trait, tab types, captures, page scripts |
//! | [`controller`] | Event and message dispatch, connection loop |
//! | [`orchestrator`] | Capture-and-upload pipeline |
//! | [`resolver`] | Finding or opening the upload tab |
//! | [`navigator`] | Folder navigation |
//! | [`folders`] | Folder discovery |
//! | [`injector`] | Attaching the image and sending it |
//! | [`store`] | Persistent preferences |
//! | [`menu`] | Destination menu model |
//! | [`protocol`] | WebSocket message types |
//! | [`transport`] | WebSocket server and connection |

// ============================================================================
// Modules
// ============================================================================

/// Browser capabilities: tabs, windows, capture, page scripts.
pub mod browser;

/// Controller configuration.
pub mod config;

/// Event and message dispatch.
pub mod controller;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Folder discovery.
pub mod folders;

/// Type-safe identifiers for browser entities.
pub mod identifiers;

/// Attaching the capture to the chat page.
pub mod injector;

/// Destination menu model.
pub mod menu;

/// Popup and options-page messages.
pub mod message;

/// Folder navigation.
pub mod navigator;

/// Capture-and-upload pipeline.
pub mod orchestrator;

/// Page selectors, snapshots and strategies.
pub mod page;

/// WebSocket protocol message types.
pub mod protocol;

/// Providers and destinations.
pub mod provider;

/// Upload tab resolution.
pub mod resolver;

/// Persistent preferences.
pub mod store;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{Browser, CapturedImage, RemoteBrowser, TabInfo, TabQuery};

// Configuration
pub use config::Config;

// Controller
pub use controller::{Controller, serve};

// Error types
pub use error::{Error, Result};

// Domain types
pub use folders::FolderRecord;
pub use orchestrator::{CaptureOrchestrator, CaptureOutcome};
pub use provider::{Destination, Provider};

// Storage
pub use store::{JsonFileStore, MemoryStore, PreferenceStore, Preferences, StoreExt};

// Identifier types
pub use identifiers::{RequestId, TabId, WindowId};
