//! Controller configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file.
//! Delays are stored as milliseconds and exposed as [`Duration`]s.
//!
//! # Example
//!
//! ```ignore
//! use shot_uploader::Config;
//!
//! let config = Config::load("shot-uploader.json")?
//!     .with_port(17400)
//!     .with_store_path("/tmp/prefs.json");
//! ```
//!
//! ```json
//! {
//!   "port": 17345,
//!   "markers": { "variant": "-deltamath" },
//!   "timing": { "focusSettleMs": 800, "tabLoadTimeoutMs": 30000 }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default port the relay extension connects to.
pub const DEFAULT_PORT: u16 = 17345;

/// Directory name under the platform config dir.
const APP_DIR: &str = "shot-uploader";

/// Preference file name.
const STORE_FILE: &str = "preferences.json";

// ============================================================================
// Config
// ============================================================================

/// Top-level controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// IP the WebSocket server binds to.
    pub bind_ip: IpAddr,

    /// Port the WebSocket server binds to.
    pub port: u16,

    /// Preference file location. `None` uses the platform config dir.
    pub store_path: Option<PathBuf>,

    /// Substring conventions inside folder identifiers and addresses.
    pub markers: Markers,

    /// Delays, poll intervals and deadlines.
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            store_path: None,
            markers: Markers::default(),
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Loads a config from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Config`] if the JSON does not describe a config
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Returns the socket address to bind.
    #[inline]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Resolves the preference file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no path is configured and the platform
    /// has no config directory.
    pub fn resolve_store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(STORE_FILE))
            .ok_or_else(|| {
                Error::config("No platform config directory. Use --store to set a path.")
            })
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Config {
    /// Sets the bind port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the preference file path.
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }
}

// ============================================================================
// Markers
// ============================================================================

/// Substring conventions encoded in folder identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Markers {
    /// Path marker that precedes a folder id in an address.
    pub folder_path: String,

    /// Substring signalling a project folder.
    pub project: String,

    /// Substring signalling the named variant that needs page preparation.
    pub variant: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            folder_path: "/g/".to_string(),
            project: "/project".to_string(),
            variant: "-deltamath".to_string(),
        }
    }
}

// ============================================================================
// Timing
// ============================================================================

/// Fixed delays and deadlines, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timing {
    /// Settle delay after focusing the chat tab.
    pub focus_settle_ms: u64,
    /// Extra delay before variant page preparation.
    pub variant_probe_ms: u64,
    /// Settle delay after a folder navigation completes.
    pub navigation_settle_ms: u64,
    /// Tab status poll interval.
    pub tab_poll_ms: u64,
    /// Deadline for a tab to finish loading.
    pub tab_load_timeout_ms: u64,
    /// Delay after clicking a page-preparation control.
    pub page_prep_ms: u64,
    /// Delay after focusing the composer.
    pub composer_focus_ms: u64,
    /// Delays before each file-input discovery retry.
    pub input_retry_ms: Vec<u64>,
    /// Delay between attaching the file and clicking send.
    pub send_delay_ms: u64,
    /// Delay before the second send attempt.
    pub send_retry_ms: u64,
    /// Delay before live folder discovery.
    pub folder_scan_delay_ms: u64,
    /// Deadline for a popup folder request.
    pub folder_request_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            focus_settle_ms: 800,
            variant_probe_ms: 500,
            navigation_settle_ms: 1000,
            tab_poll_ms: 150,
            tab_load_timeout_ms: 30_000,
            page_prep_ms: 1500,
            composer_focus_ms: 500,
            input_retry_ms: vec![1500, 2000],
            send_delay_ms: 800,
            send_retry_ms: 1000,
            folder_scan_delay_ms: 500,
            folder_request_timeout_ms: 5000,
        }
    }
}

impl Timing {
    /// Settle delay after focusing the chat tab.
    #[inline]
    #[must_use]
    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    /// Extra delay before variant page preparation.
    #[inline]
    #[must_use]
    pub fn variant_probe(&self) -> Duration {
        Duration::from_millis(self.variant_probe_ms)
    }

    /// Settle delay after a folder navigation.
    #[inline]
    #[must_use]
    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    /// Tab status poll interval.
    #[inline]
    #[must_use]
    pub fn tab_poll(&self) -> Duration {
        Duration::from_millis(self.tab_poll_ms)
    }

    /// Deadline for a tab to finish loading.
    #[inline]
    #[must_use]
    pub fn tab_load_timeout(&self) -> Duration {
        Duration::from_millis(self.tab_load_timeout_ms)
    }

    /// Delay after clicking a page-preparation control.
    #[inline]
    #[must_use]
    pub fn page_prep(&self) -> Duration {
        Duration::from_millis(self.page_prep_ms)
    }

    /// Delay after focusing the composer.
    #[inline]
    #[must_use]
    pub fn composer_focus(&self) -> Duration {
        Duration::from_millis(self.composer_focus_ms)
    }

    /// Retry delays for file-input discovery, in order.
    #[must_use]
    pub fn input_retries(&self) -> impl Iterator<Item = Duration> + '_ {
        self.input_retry_ms.iter().copied().map(Duration::from_millis)
    }

    /// Delay between attaching the file and clicking send.
    #[inline]
    #[must_use]
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    /// Delay before the second send attempt.
    #[inline]
    #[must_use]
    pub fn send_retry(&self) -> Duration {
        Duration::from_millis(self.send_retry_ms)
    }

    /// Delay before live folder discovery.
    #[inline]
    #[must_use]
    pub fn folder_scan_delay(&self) -> Duration {
        Duration::from_millis(self.folder_scan_delay_ms)
    }

    /// Deadline for a popup folder request.
    #[inline]
    #[must_use]
    pub fn folder_request_timeout(&self) -> Duration {
        Duration::from_millis(self.folder_request_timeout_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
