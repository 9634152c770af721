//! Browser capabilities the controller relies on.
//!
//! The [`Browser`] trait is the seam between orchestration logic and the
//! actual browser. [`RemoteBrowser`] implements it over the relay
//! extension's WebSocket connection.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Browser`] | Tab, window, capture and scripting operations |
//! | [`RemoteBrowser`] | Implementation over a [`Connection`](crate::transport::Connection) |
//! | [`TabInfo`] | Tab snapshot |
//! | [`CapturedImage`] | Visible-area capture |
//! | [`PageScript`] | Named page-context script |
//!
//! # Example
//!
//! ```ignore
//! let browser = RemoteBrowser::new(accepted.connection);
//! let tabs = browser.query_tabs(&TabQuery::urls(Provider::ChatGpt.url_patterns())).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{TabId, WindowId};

// ============================================================================
// Submodules
// ============================================================================

/// Remote implementation over the relay connection.
pub mod remote;

/// Visible-area capture types.
pub mod screenshot;

/// Named page-context scripts.
pub mod script;

/// Tab snapshots, queries and updates.
pub mod tab;

/// Deadline-bounded wait for tab load.
pub mod wait;

#[cfg(test)]
pub(crate) mod fake;

// ============================================================================
// Re-exports
// ============================================================================

pub use remote::RemoteBrowser;
pub use screenshot::{CapturedImage, ImageFormat};
pub use script::PageScript;
pub use tab::{TabInfo, TabQuery, TabStatus, TabUpdate, prefer_complete};
pub use wait::{LoadState, wait_for_tab_complete};

// ============================================================================
// Browser
// ============================================================================

/// Browser operations used by the capture pipeline.
///
/// Every method maps to one WebExtension call made by the relay.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Lists tabs matching the query.
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabInfo>>;

    /// Fetches one tab.
    ///
    /// Returns [`Error::TabNotFound`](crate::Error::TabNotFound) for closed tabs.
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo>;

    /// Opens a tab at `url`.
    async fn create_tab(&self, url: &str, active: bool) -> Result<TabInfo>;

    /// Navigates and/or activates a tab.
    async fn update_tab(&self, tab_id: TabId, update: &TabUpdate) -> Result<TabInfo>;

    /// Brings a window to the front.
    async fn focus_window(&self, window_id: WindowId) -> Result<()>;

    /// Captures the visible area of a window's active tab as a data URL.
    async fn capture_visible_tab(&self, window_id: WindowId, format: ImageFormat)
    -> Result<String>;

    /// Runs a page script in the tab's main frame and returns its value.
    async fn execute_script(
        &self,
        tab_id: TabId,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value>;
}
