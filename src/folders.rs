//! Folder discovery.
//!
//! Folder links in the provider's sidebar carry the folder id after the
//! folder marker (`/g/<id>`). Discovery probes the page once and then tries
//! the `targeted` strategy and, only if that finds nothing, the `loose` one.

// ============================================================================
// Imports
// ============================================================================

use chrono::Utc;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::browser::Browser;
use crate::browser::script::FOLDER_SCAN;
use crate::error::Result;
use crate::identifiers::TabId;
use crate::page::{FolderSnapshot, LinkNode, Strategy, first_match};
use crate::store::{PreferenceStore, StoreExt};

// ============================================================================
// FolderRecord
// ============================================================================

/// A folder shown in the destination menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderRecord {
    /// Opaque folder id.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl FolderRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ============================================================================
// Selectors and id extraction
// ============================================================================

/// Targeted folder selectors for a marker, most specific first.
#[must_use]
pub fn folder_selectors(marker: &str) -> Vec<String> {
    vec![
        format!(r#"a[href^="{marker}"]"#),
        format!(r#".sidebar a[href*="{marker}"]"#),
        format!(r#"nav a[href*="{marker}"]"#),
        format!(r#"aside a[href*="{marker}"]"#),
        format!(r#"[role="navigation"] a[href*="{marker}"]"#),
        format!(r#"div[class*="sidebar"] a[href*="{marker}"]"#),
        format!(r#"a[href*="{marker}"]"#),
    ]
}

/// Id from an href: after a leading marker, or after the last one.
#[must_use]
pub fn folder_id_from_href<'a>(href: &'a str, marker: &str) -> Option<&'a str> {
    let rest = match href.strip_prefix(marker) {
        Some(rest) => rest,
        None => after_last_marker(href, marker)?,
    };
    first_segment(rest)
}

/// Id after the last marker occurrence.
fn loose_folder_id<'a>(href: &'a str, marker: &str) -> Option<&'a str> {
    first_segment(after_last_marker(href, marker)?)
}

fn after_last_marker<'a>(href: &'a str, marker: &str) -> Option<&'a str> {
    href.rfind(marker).map(|pos| &href[pos + marker.len()..])
}

fn first_segment(rest: &str) -> Option<&str> {
    rest.split('/').next().filter(|id| !id.is_empty())
}

// ============================================================================
// Strategies
// ============================================================================

/// Snapshot plus the marker the strategies split on.
#[derive(Debug, Clone)]
pub struct FolderScan {
    /// Probe result.
    pub snapshot: FolderSnapshot,
    /// Folder marker, `/g/` by default.
    pub marker: String,
}

/// Folder strategies in priority order.
pub const FOLDER_STRATEGIES: &[Strategy<FolderScan, Vec<FolderRecord>>] = &[
    Strategy {
        name: "targeted",
        run: targeted,
    },
    Strategy {
        name: "loose",
        run: loose,
    },
];

/// Collects records, skipping ids already seen.
#[derive(Default)]
struct Collector {
    seen: FxHashSet<String>,
    records: Vec<FolderRecord>,
}

impl Collector {
    fn push(&mut self, id: &str, name: &str) {
        if self.seen.insert(id.to_string()) {
            self.records.push(FolderRecord::new(id, name));
        }
    }

    fn finish(self) -> Option<Vec<FolderRecord>> {
        (!self.records.is_empty()).then_some(self.records)
    }
}

/// Links of the first selector that matched anything.
fn targeted(scan: &FolderScan) -> Option<Vec<FolderRecord>> {
    let hits = scan.snapshot.targeted.iter().find(|h| !h.links.is_empty())?;
    debug!(selector = %hits.selector, count = hits.links.len(), "Folder selector matched");

    let mut collector = Collector::default();
    for link in &hits.links {
        let Some(id) = link
            .href
            .as_deref()
            .and_then(|href| folder_id_from_href(href, &scan.marker))
        else {
            continue;
        };

        let name = if link.text.is_empty() {
            link.child_text.as_str()
        } else {
            link.text.as_str()
        };
        if !name.is_empty() {
            collector.push(id, name);
        }
    }
    collector.finish()
}

/// Every marker link, with generous name fallbacks.
fn loose(scan: &FolderScan) -> Option<Vec<FolderRecord>> {
    let mut collector = Collector::default();
    for link in &scan.snapshot.all_links {
        let Some(id) = link
            .href
            .as_deref()
            .and_then(|href| loose_folder_id(href, &scan.marker))
        else {
            continue;
        };
        collector.push(id, &loose_name(link, id));
    }
    collector.finish()
}

fn loose_name(link: &LinkNode, id: &str) -> String {
    let too_short = |name: &str| name.chars().count() < 2;

    let mut name = link.text.as_str();
    if too_short(name) {
        name = link.parent_text.as_str();
    }
    if too_short(name) {
        name = id.rsplit('-').next().filter(|s| !s.is_empty()).unwrap_or(id);
    }
    name.to_string()
}

/// Runs the folder strategies over a snapshot.
#[must_use]
pub fn scan_folders(scan: &FolderScan) -> Vec<FolderRecord> {
    match first_match(FOLDER_STRATEGIES, scan) {
        Some((strategy, folders)) => {
            debug!(strategy, count = folders.len(), "Folders found");
            folders
        }
        None => Vec::new(),
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Discovers folders on a tab and persists a non-empty result.
///
/// An empty result is returned as-is and leaves the stored list untouched.
///
/// # Errors
///
/// Returns the probe error if the script could not run or returned an
/// unexpected shape. A failed save is logged, not returned.
pub async fn discover_folders(
    browser: &dyn Browser,
    store: &dyn PreferenceStore,
    tab_id: TabId,
    marker: &str,
) -> Result<Vec<FolderRecord>> {
    let value = browser
        .execute_script(
            tab_id,
            &FOLDER_SCAN,
            vec![json!(folder_selectors(marker)), json!(marker)],
        )
        .await?;

    let scan = FolderScan {
        snapshot: serde_json::from_value(value)?,
        marker: marker.to_string(),
    };
    let folders = scan_folders(&scan);

    if folders.is_empty() {
        debug!(%tab_id, "No folders on page");
        return Ok(folders);
    }

    match store.save_folders(folders.clone(), Utc::now()).await {
        Ok(()) => info!(count = folders.len(), "Saved folders"),
        Err(e) => warn!(error = %e, "Failed to save folders"),
    }
    Ok(folders)
}

// ============================================================================
// Tests
// ============================================================================
