//! Error types for shot-uploader.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use shot_uploader::{Result, Error};
//!
//! async fn example(browser: &dyn Browser) -> Result<()> {
//!     let tab = browser.get_tab(tab_id).await?;
//!     browser.focus_window(tab.window_id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Store`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::InvalidArgument`], [`Error::Protocol`] |
//! | Browser | [`Error::NoActiveTab`], [`Error::TabNotFound`], [`Error::Capture`] |
//! | Execution | [`Error::ScriptError`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the config file or CLI arguments are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Preference store error.
    ///
    /// Returned when the persisted preferences cannot be read or written.
    #[error("Store error at {path}: {message}")]
    Store {
        /// Backing file of the store.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout waiting for the relay extension.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Invalid argument in command params or inbound message.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Protocol violation or error response from the remote end.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Browser Errors
    // ========================================================================
    /// No active tab in the last focused window.
    ///
    /// Fatal for the capture that hit it.
    #[error("No active tab")]
    NoActiveTab,

    /// Tab not found.
    ///
    /// Returned when a tab ID no longer resolves (closed or never existed).
    #[error("Tab not found: {tab_id}")]
    TabNotFound {
        /// The missing tab ID.
        tab_id: TabId,
    },

    /// Captured image could not be decoded.
    #[error("Capture error: {message}")]
    Capture {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Page script failed in the browser.
    #[error("Script error in {script}: {message}")]
    ScriptError {
        /// Name of the page script.
        script: String,
        /// Error message from script execution.
        message: String,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a store error.
    #[inline]
    pub fn store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(limit: Duration) -> Self {
        Self::ConnectionTimeout {
            timeout_ms: millis(limit),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a tab not found error.
    #[inline]
    pub fn tab_not_found(tab_id: TabId) -> Self {
        Self::TabNotFound { tab_id }
    }

    /// Creates a capture error.
    #[inline]
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(script: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptError {
            script: script.into(),
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, limit: Duration) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms: millis(limit),
        }
    }
}

/// Whole milliseconds in `limit`, saturating.
fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if the error means the tab is gone.
    ///
    /// Wait-for-load treats such a tab as finished.
    #[inline]
    #[must_use]
    pub fn is_tab_gone(&self) -> bool {
        matches!(self, Self::TabNotFound { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_no_active_tab_display() {
        assert_eq!(Error::NoActiveTab.to_string(), "No active tab");
    }

    #[test]
    fn test_script_error_display() {
        let err = Error::script_error("folderScan", "document is not defined");
        assert_eq!(
            err.to_string(),
            "Script error in folderScan: document is not defined"
        );
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::ConnectionTimeout { timeout_ms: 5000 };
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_timeout_millis_saturate() {
        let err = Error::connection_timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Connection timeout after 1500ms");

        let err = Error::connection_timeout(Duration::MAX);
        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: u64::MAX }));
    }

    #[test]
    fn test_is_tab_gone() {
        let tab_id = TabId::new(7).expect("valid tab id");
        assert!(Error::tab_not_found(tab_id).is_tab_gone());
        assert!(!Error::NoActiveTab.is_tab_gone());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
