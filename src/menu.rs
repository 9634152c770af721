//! Destination menu model for the popup.
//!
//! The popup renders a select box of destinations and one line of status
//! text. This module decides what goes into them; rendering stays with the
//! popup, which receives a [`DestinationMenu`] in reply to
//! `getDestinationMenu`.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::Result;
use crate::folders::FolderRecord;
use crate::message::FoldersReply;
use crate::provider::Destination;

/// Label of the main chat entry.
pub const MAIN_LABEL: &str = "Main Chat";

const CHECKING_STATUS: &str = "Checking for folders...";

const STORED_STATUS: &str = "Using saved folders. Click refresh to update.";
const LIVE_STATUS: &str = "Upload to selected folder in ChatGPT.";
const EMPTY_STATUS: &str = "No folders detected. Use refresh button to load folders.";
const SAVED_INDICATOR: &str = "✓ Using saved folder preference";

/// One selectable destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    /// Value stored as `preferredFolderId`.
    pub value: String,
    /// Text shown to the user.
    pub label: String,
}

/// The popup's destination list and status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationMenu {
    /// Main chat first, then folders.
    pub entries: Vec<MenuEntry>,
    /// Value of the selected entry.
    pub selected: String,
    /// Status line under the list.
    pub status: String,
    /// Shown when the stored destination was preselected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<String>,
}

impl DestinationMenu {
    /// Builds the menu for a folder list.
    ///
    /// Records with an empty id or name are skipped. The stored destination
    /// is preselected only when the list has folders and contains it.
    #[must_use]
    pub fn build(folders: &[FolderRecord], from_storage: bool, preferred: &Destination) -> Self {
        let mut entries = vec![MenuEntry {
            value: Destination::Main.as_str().to_string(),
            label: MAIN_LABEL.to_string(),
        }];
        entries.extend(
            folders
                .iter()
                .filter(|f| !f.id.is_empty() && !f.name.is_empty())
                .map(|f| MenuEntry {
                    value: f.id.clone(),
                    label: f.name.clone(),
                }),
        );

        let mut menu = Self {
            selected: entries[0].value.clone(),
            entries,
            status: EMPTY_STATUS.to_string(),
            indicator: None,
        };
        if folders.is_empty() {
            return menu;
        }

        menu.status = if from_storage { STORED_STATUS } else { LIVE_STATUS }.to_string();

        let wanted = preferred.as_str();
        if let Some(entry) = menu.entries.iter().find(|e| e.value == wanted) {
            menu.selected = entry.value.clone();
            menu.status = format!("Upload to {}", entry.label);
            menu.indicator = Some(SAVED_INDICATOR.to_string());
        } else {
            debug!(destination = wanted, "Stored destination not in folder list");
        }
        menu
    }

    /// Menu shown before the first folder request answers.
    #[must_use]
    pub fn initial(saved: &[FolderRecord], preferred: &Destination) -> Self {
        let mut menu = Self::build(saved, true, preferred);
        if saved.is_empty() {
            menu.status = CHECKING_STATUS.to_string();
        }
        menu
    }

    /// Label of the selected entry.
    #[must_use]
    pub fn selected_label(&self) -> &str {
        self.entries
            .iter()
            .find(|e| e.value == self.selected)
            .map_or(MAIN_LABEL, |e| e.label.as_str())
    }
}

/// Runs a `getFolders` request against a deadline.
///
/// A timeout or a failed request reads as the stored folders. The
/// controller uses [`Timing::folder_request_timeout`](crate::config::Timing::folder_request_timeout)
/// as `limit`.
pub async fn fetch_folders<F>(request: F, saved: &[FolderRecord], limit: Duration) -> FoldersReply
where
    F: Future<Output = Result<FoldersReply>>,
{
    match timeout(limit, request).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            warn!(error = %e, "Folder request failed");
            FoldersReply::stored(saved.to_vec())
        }
        Err(_) => {
            debug!(timeout = ?limit, "Folder request timed out, using stored folders");
            FoldersReply::stored(saved.to_vec())
        }
    }
}

/// Menu after a folder request, or `None` to keep showing stored folders.
///
/// A stored-folder reply replaces the list only when nothing was stored.
#[must_use]
pub fn refresh_menu(
    saved: &[FolderRecord],
    reply: &FoldersReply,
    preferred: &Destination,
) -> Option<DestinationMenu> {
    (!reply.from_storage || saved.is_empty())
        .then(|| DestinationMenu::build(&reply.folders, reply.from_storage, preferred))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::config::Timing;
    use crate::error::Error;

    fn folders() -> Vec<FolderRecord> {
        vec![
            FolderRecord::new("g-p-1", "Algebra"),
            FolderRecord::new("", "No id"),
            FolderRecord::new("g-p-2", ""),
            FolderRecord::new("g-p-3", "Geometry"),
        ]
    }

    #[test]
    fn test_entries_skip_incomplete_records() {
        let menu = DestinationMenu::build(&folders(), false, &Destination::Main);
        let values: Vec<&str> = menu.entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["main", "g-p-1", "g-p-3"]);
        assert_eq!(menu.entries[0].label, MAIN_LABEL);
    }

    #[test]
    fn test_preferred_folder_is_selected() {
        let menu = DestinationMenu::build(&folders(), true, &Destination::parse("g-p-3"));
        assert_eq!(menu.selected, "g-p-3");
        assert_eq!(menu.selected_label(), "Geometry");
        assert_eq!(menu.status, "Upload to Geometry");
        assert!(menu.indicator.is_some());
    }

    #[test]
    fn test_missing_preference_keeps_main() {
        let menu = DestinationMenu::build(&folders(), true, &Destination::parse("g-p-9"));
        assert_eq!(menu.selected, "main");
        assert_eq!(menu.status, STORED_STATUS);
        assert!(menu.indicator.is_none());

        let live = DestinationMenu::build(&folders(), false, &Destination::parse("g-p-9"));
        assert_eq!(live.status, LIVE_STATUS);
    }

    #[test]
    fn test_empty_list() {
        let menu = DestinationMenu::build(&[], false, &Destination::parse("g-p-1"));
        assert_eq!(menu.entries.len(), 1);
        assert_eq!(menu.selected, "main");
        assert_eq!(menu.status, EMPTY_STATUS);
    }

    #[test]
    fn test_menu_shape() {
        let menu = DestinationMenu::build(&folders()[..1], false, &Destination::parse("g-p-9"));
        assert_eq!(
            serde_json::to_value(&menu).expect("serialize"),
            json!({
                "entries": [
                    {"value": "main", "label": "Main Chat"},
                    {"value": "g-p-1", "label": "Algebra"}
                ],
                "selected": "main",
                "status": LIVE_STATUS
            })
        );
    }

    #[test]
    fn test_initial_menu() {
        let checking = DestinationMenu::initial(&[], &Destination::Main);
        assert_eq!(checking.status, CHECKING_STATUS);

        let saved = DestinationMenu::initial(&folders(), &Destination::parse("g-p-1"));
        assert_eq!(saved.selected, "g-p-1");
        assert_eq!(saved.status, "Upload to Algebra");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_times_out_to_stored() {
        let saved = vec![FolderRecord::new("g-p-1", "Algebra")];
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(FoldersReply::live(Vec::new()))
        };

        let limit = Timing::default().folder_request_timeout();
        let reply = fetch_folders(slow, &saved, limit).await;
        assert_eq!(reply, FoldersReply::stored(saved));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_reads_stored() {
        let reply = fetch_folders(
            async { Err(Error::ConnectionClosed) },
            &[],
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(reply, FoldersReply::stored(Vec::new()));
    }

    #[test]
    fn test_refresh_rules() {
        let saved = vec![FolderRecord::new("g-p-1", "Algebra")];
        let live = FoldersReply::live(vec![FolderRecord::new("g-p-2", "Physics")]);
        let stored = FoldersReply::stored(saved.clone());

        assert!(refresh_menu(&saved, &live, &Destination::Main).is_some());
        assert!(refresh_menu(&saved, &stored, &Destination::Main).is_none());

        let first_run = refresh_menu(&[], &FoldersReply::empty(None), &Destination::Main)
            .expect("menu");
        assert_eq!(first_run.status, EMPTY_STATUS);
    }
}
