//! Tab snapshots, queries and updates.
//!
//! These mirror the shapes the relay extension reports for `tabs.*` calls.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{TabId, WindowId};

// ============================================================================
// TabStatus
// ============================================================================

/// Loading status of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    /// Page is still loading.
    #[default]
    Loading,
    /// Page finished loading.
    Complete,
    /// Tab was unloaded by the browser.
    Unloaded,
}

// ============================================================================
// TabInfo
// ============================================================================

/// Snapshot of a browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    /// Tab ID.
    pub id: TabId,
    /// Containing window.
    pub window_id: WindowId,
    /// Current address, if the extension may see it.
    #[serde(default)]
    pub url: Option<String>,
    /// Loading status.
    #[serde(default)]
    pub status: TabStatus,
    /// Whether the tab is the active tab of its window.
    #[serde(default)]
    pub active: bool,
    /// Whether the browser discarded the tab's content.
    #[serde(default)]
    pub discarded: bool,
}

impl TabInfo {
    /// Returns `true` if the tab finished loading.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == TabStatus::Complete
    }

    /// Returns the URL or an empty string.
    #[inline]
    #[must_use]
    pub fn url_str(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }
}

/// Picks the first completed tab, or the first tab if none completed.
#[must_use]
pub fn prefer_complete(tabs: &[TabInfo]) -> Option<&TabInfo> {
    tabs.iter().find(|t| t.is_complete()).or_else(|| tabs.first())
}

// ============================================================================
// TabQuery
// ============================================================================

/// Filter for `tabs.query`.
///
/// Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    /// Only the active tab of each window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Only tabs in the last focused window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_focused_window: Option<bool>,
    /// Match patterns (`https://host/*`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<String>,
}

impl TabQuery {
    /// Matches every tab.
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches the active tab of the last focused window.
    #[must_use]
    pub fn active_in_last_focused() -> Self {
        Self {
            active: Some(true),
            last_focused_window: Some(true),
            url: Vec::new(),
        }
    }

    /// Matches tabs whose address fits any of the patterns.
    #[must_use]
    pub fn urls(patterns: &[&str]) -> Self {
        Self {
            url: patterns.iter().map(|p| (*p).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Returns `true` if the URL satisfies the pattern filter.
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        self.url.is_empty() || self.url.iter().any(|p| pattern_matches(p, url))
    }
}

/// Matches a URL against a `*`-suffix match pattern.
///
/// Only trailing wildcards are supported; anything else is an exact match.
#[must_use]
pub fn pattern_matches(pattern: &str, url: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => url.starts_with(prefix),
        None => url == pattern,
    }
}

// ============================================================================
// TabUpdate
// ============================================================================

/// Properties for `tabs.update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdate {
    /// Navigate to this address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Make the tab active in its window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl TabUpdate {
    /// Navigates the tab.
    #[must_use]
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            active: None,
        }
    }

    /// Activates the tab.
    #[must_use]
    pub fn activate() -> Self {
        Self {
            url: None,
            active: Some(true),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
